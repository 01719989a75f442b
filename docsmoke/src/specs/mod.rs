// The smoke suite. Cases must not depend on each other.

pub mod buttons;
pub mod links;
pub mod smoke;

use docsmoke_core::{TestCase, TestRegistry};

pub fn all() -> Vec<TestCase> {
    let mut cases = smoke::cases();
    cases.extend(buttons::cases());
    cases.extend(links::cases());
    cases
}

pub fn registry() -> TestRegistry {
    let mut registry = TestRegistry::new();
    registry.extend(all());
    registry
}
