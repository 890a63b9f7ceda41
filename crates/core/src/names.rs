//! Random display names for players who don't pick one

use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Brave", "Calm", "Clever", "Eager", "Fancy", "Gentle", "Happy", "Jolly", "Kind", "Lucky",
    "Mighty", "Nimble", "Proud", "Quiet", "Swift", "Witty",
];

const COLORS: &[&str] = &[
    "Amber", "Azure", "Coral", "Crimson", "Golden", "Indigo", "Ivory", "Jade", "Lilac", "Olive",
    "Ruby", "Scarlet", "Silver", "Teal",
];

const ANIMALS: &[&str] = &[
    "Badger", "Falcon", "Ferret", "Gecko", "Heron", "Koala", "Lemur", "Lynx", "Moose", "Otter",
    "Panda", "Puffin", "Raven", "Tiger", "Walrus", "Yak",
];

fn pick<R: Rng + ?Sized>(list: &[&'static str], rng: &mut R) -> &'static str {
    list.choose(rng).copied().unwrap_or_default()
}

/// Adjective + color + animal, capitalized and joined, e.g. `BraveAmberOtter`
pub fn random_display_name_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = pick(ADJECTIVES, rng);
    let color = pick(COLORS, rng);
    let animal = pick(ANIMALS, rng);
    format!("{adjective}{color}{animal}")
}

pub fn random_display_name() -> String {
    random_display_name_with(&mut rand::thread_rng())
}

/// The given name trimmed, or a random one if it is blank
pub fn display_name_or_random(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        random_display_name()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_name_parts() {
        let mut rng = StdRng::seed_from_u64(42);
        let name = random_display_name_with(&mut rng);
        assert!(ADJECTIVES.iter().any(|a| name.starts_with(a)));
        assert!(ANIMALS.iter().any(|a| name.ends_with(a)));
    }

    #[test]
    fn test_blank_name_replaced() {
        assert_eq!(display_name_or_random("  Ada "), "Ada");
        assert!(!display_name_or_random("   ").is_empty());
    }
}
