//! Test data generation for benchmarks.
//!
//! Generators are deterministic so runs are reproducible across backends.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ormbench_core::User;

/// User at position `index` of the preload sequence.
pub fn user(index: usize) -> User {
    User::new(
        format!("user{}", index),
        format!("user{}@example.com", index),
        20 + (index % 50) as i32,
    )
}

/// Generate `count` unsaved users with the preload naming scheme.
pub fn generate_users(count: usize) -> Vec<User> {
    (0..count).map(user).collect()
}

/// One batch of `size` unsaved users for round `round`.
pub fn batch(round: usize, size: usize) -> Vec<User> {
    (0..size)
        .map(|j| {
            User::new(
                format!("user{}_{}", round, j),
                format!("user{}_{}@example.com", round, j),
                20 + (j % 50) as i32,
            )
        })
        .collect()
}

/// Generate `count` unsaved users with seeded random ages.
pub fn generate_random_users(count: usize) -> Vec<User> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);

    let name_prefixes = [
        "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack",
    ];

    (0..count)
        .map(|i| {
            let name_prefix = name_prefixes[i % name_prefixes.len()];
            let name = format!("{}_{}", name_prefix, i);
            let email = format!("user{}@example{}.com", i, i % 10);
            let age = 18 + (rng.gen::<u32>() % 60) as i32;
            User::new(name, email, age)
        })
        .collect()
}
