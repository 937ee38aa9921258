//! Display names for spawned agents

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand::Rng;

const DEFAULT_NAMES: [&str; 16] = [
    "Abacus", "Bramble", "Cinder", "Dynamo", "Ember", "Flint", "Gristle", "Hatchet", "Ironside",
    "Jolt", "Kestrel", "Lockjaw", "Mortar", "Nettle", "Onslaught", "Piston",
];

/// Names handed out so that no two live agents share one
#[derive(Debug, Clone)]
pub struct NamePool {
    names: Vec<String>,
    in_use: AHashSet<String>,
}

impl NamePool {
    /// Pool over `names`, or a built-in list when empty
    pub fn new(names: &[String]) -> Self {
        let names = if names.is_empty() {
            DEFAULT_NAMES.iter().map(|n| n.to_string()).collect()
        } else {
            names.to_vec()
        };
        Self {
            names,
            in_use: AHashSet::new(),
        }
    }

    /// Take an unused name, numbering past the pool once it runs dry
    pub fn acquire<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let free: Vec<&String> = self.names.iter().filter(|n| !self.in_use.contains(*n)).collect();
        let name = match free.choose(rng) {
            Some(name) => (*name).clone(),
            None => (1..)
                .map(|n| format!("Bot {}", n))
                .find(|candidate| !self.in_use.contains(candidate))
                .unwrap_or_default(),
        };
        self.in_use.insert(name.clone());
        name
    }

    /// Mark a name assigned elsewhere (pooled agents keep theirs)
    pub fn reserve(&mut self, name: &str) {
        self.in_use.insert(name.to_string());
    }

    pub fn release(&mut self, name: &str) {
        self.in_use.remove(name);
    }

    pub fn is_in_use(&self, name: &str) -> bool {
        self.in_use.contains(name)
    }
}
