//! The fixed card pools. The cost distributions are part of the game's
//! balance and must be reproduced exactly; only the shuffle varies.

use crate::{Coupon, Goal, Mine};

const fn c(reputation: i32, costs: [u8; 5], kind: Mine, tier: u8, idx: u32) -> Coupon {
    Coupon {
        reputation,
        costs,
        kind,
        tier,
        idx,
    }
}

const fn g(condition: [u8; 5], idx: u32) -> Goal {
    Goal {
        reputation: 3,
        condition,
        idx,
        owner: None,
    }
}

/// The ten goal cards; `players + 1` of these are drawn per game.
/// Conditions are owned-card counts per color.
pub fn goal_pool() -> Vec<Goal> {
    vec![
        g([0, 0, 0, 4, 4], 0),
        g([0, 4, 4, 0, 0], 1),
        g([3, 3, 3, 0, 0], 2),
        g([0, 3, 3, 3, 0], 3),
        g([3, 0, 0, 3, 3], 4),
        g([3, 0, 3, 0, 3], 5),
        g([4, 0, 4, 0, 0], 6),
        g([4, 0, 0, 0, 4], 7),
        g([0, 4, 0, 4, 0], 8),
        g([0, 3, 0, 3, 3], 9),
    ]
}

/// Tier-1 deck: 40 cards, reputation 0-1.
pub fn tier1() -> Vec<Coupon> {
    use Mine::*;
    vec![
        c(0, [0, 0, 0, 3, 0], Copper, 1, 1),
        c(0, [1, 0, 0, 1, 3], Copper, 1, 2),
        c(0, [0, 2, 1, 0, 0], Copper, 1, 3),
        c(0, [0, 0, 1, 2, 2], Copper, 1, 4),
        c(0, [0, 1, 1, 2, 1], Copper, 1, 5),
        c(0, [0, 1, 1, 1, 1], Copper, 1, 6),
        c(0, [2, 0, 0, 2, 0], Copper, 1, 7),
        c(1, [0, 0, 0, 4, 0], Copper, 1, 8),
        c(0, [0, 0, 0, 1, 2], Diamond, 1, 9),
        c(0, [2, 0, 1, 1, 1], Diamond, 1, 10),
        c(0, [1, 0, 1, 1, 1], Diamond, 1, 11),
        c(0, [1, 1, 3, 0, 0], Diamond, 1, 12),
        c(0, [0, 0, 0, 0, 3], Diamond, 1, 13),
        c(0, [2, 0, 2, 1, 0], Diamond, 1, 14),
        c(0, [0, 0, 2, 0, 2], Diamond, 1, 15),
        c(1, [0, 0, 0, 0, 4], Diamond, 1, 16),
        c(0, [0, 1, 0, 2, 0], Emerald, 1, 17),
        c(0, [2, 2, 0, 0, 0], Emerald, 1, 18),
        c(0, [0, 3, 1, 1, 0], Emerald, 1, 19),
        c(0, [1, 1, 0, 1, 1], Emerald, 1, 20),
        c(0, [1, 1, 0, 1, 2], Emerald, 1, 21),
        c(0, [2, 1, 0, 0, 2], Emerald, 1, 22),
        c(0, [3, 0, 0, 0, 0], Emerald, 1, 23),
        c(1, [0, 0, 0, 0, 4], Emerald, 1, 24),
        c(0, [0, 2, 2, 0, 1], Iron, 1, 25),
        c(0, [2, 0, 0, 0, 1], Iron, 1, 26),
        c(0, [1, 1, 1, 0, 1], Iron, 1, 27),
        c(0, [0, 3, 0, 0, 0], Iron, 1, 28),
        c(0, [0, 2, 0, 0, 2], Iron, 1, 29),
        c(0, [1, 1, 2, 0, 1], Iron, 1, 30),
        c(0, [0, 1, 0, 0, 1], Iron, 1, 31),
        c(1, [0, 0, 4, 0, 0], Iron, 1, 32),
        c(0, [1, 1, 1, 1, 0], Netherite, 1, 33),
        c(0, [1, 0, 2, 0, 0], Netherite, 1, 34),
        c(0, [0, 0, 2, 2, 0], Netherite, 1, 35),
        c(0, [3, 0, 1, 0, 1], Netherite, 1, 36),
        c(0, [0, 0, 3, 0, 0], Netherite, 1, 37),
        c(0, [1, 2, 1, 1, 0], Netherite, 1, 38),
        c(0, [1, 2, 0, 1, 0], Netherite, 1, 39),
        c(1, [0, 4, 0, 0, 0], Netherite, 1, 40),
    ]
}

/// Tier-2 deck: 30 cards, reputation 1-3.
pub fn tier2() -> Vec<Coupon> {
    use Mine::*;
    vec![
        c(1, [2, 3, 0, 0, 3], Copper, 2, 41),
        c(1, [2, 0, 0, 2, 3], Copper, 2, 42),
        c(2, [0, 4, 2, 1, 0], Copper, 2, 43),
        c(2, [0, 0, 0, 3, 5], Copper, 2, 44),
        c(2, [0, 0, 0, 0, 5], Copper, 2, 45),
        c(3, [6, 0, 0, 0, 0], Copper, 2, 46),
        c(1, [3, 2, 2, 0, 0], Diamond, 2, 47),
        c(1, [0, 2, 3, 0, 3], Diamond, 2, 48),
        c(2, [0, 3, 0, 5, 0], Diamond, 2, 49),
        c(2, [0, 5, 0, 0, 0], Diamond, 2, 50),
        c(2, [1, 0, 0, 2, 4], Diamond, 2, 51),
        c(3, [0, 6, 0, 0, 0], Diamond, 2, 52),
        c(1, [3, 0, 2, 3, 0], Emerald, 2, 53),
        c(1, [0, 3, 0, 3, 2], Emerald, 2, 54),
        c(2, [0, 2, 0, 4, 1], Emerald, 2, 55),
        c(2, [0, 0, 5, 0, 0], Emerald, 2, 56),
        c(2, [0, 5, 3, 0, 0], Emerald, 2, 57),
        c(3, [0, 0, 6, 0, 0], Emerald, 2, 58),
        c(1, [2, 0, 3, 0, 2], Iron, 2, 59),
        c(1, [3, 3, 0, 2, 0], Iron, 2, 60),
        c(2, [4, 0, 1, 0, 2], Iron, 2, 61),
        c(2, [5, 0, 0, 0, 0], Iron, 2, 62),
        c(2, [5, 0, 0, 0, 3], Iron, 2, 63),
        c(3, [0, 0, 0, 6, 0], Iron, 2, 64),
        c(1, [0, 2, 2, 3, 0], Netherite, 2, 65),
        c(1, [0, 0, 3, 3, 2], Netherite, 2, 66),
        c(2, [2, 1, 4, 0, 0], Netherite, 2, 67),
        c(2, [0, 0, 0, 5, 0], Netherite, 2, 68),
        c(2, [3, 0, 5, 0, 0], Netherite, 2, 69),
        c(3, [0, 0, 0, 0, 6], Netherite, 2, 70),
    ]
}

/// Tier-3 deck: 20 cards, reputation 3-5.
pub fn tier3() -> Vec<Coupon> {
    use Mine::*;
    vec![
        c(3, [0, 5, 3, 3, 3], Copper, 3, 71),
        c(4, [0, 0, 7, 0, 0], Copper, 3, 72),
        c(4, [3, 3, 6, 0, 0], Copper, 3, 73),
        c(5, [3, 0, 7, 0, 0], Copper, 3, 74),
        c(3, [3, 0, 3, 3, 5], Diamond, 3, 75),
        c(4, [0, 0, 0, 7, 0], Diamond, 3, 76),
        c(4, [0, 3, 0, 6, 3], Diamond, 3, 77),
        c(5, [0, 3, 0, 7, 0], Diamond, 3, 78),
        c(3, [3, 3, 0, 5, 3], Emerald, 3, 79),
        c(4, [0, 6, 3, 3, 0], Emerald, 3, 80),
        c(4, [0, 7, 0, 0, 0], Emerald, 3, 81),
        c(5, [0, 7, 3, 0, 0], Emerald, 3, 82),
        c(3, [5, 3, 3, 0, 3], Iron, 3, 83),
        c(4, [0, 0, 0, 0, 7], Iron, 3, 84),
        c(4, [3, 0, 0, 3, 6], Iron, 3, 85),
        c(5, [0, 0, 0, 3, 7], Iron, 3, 86),
        c(3, [3, 3, 5, 3, 0], Netherite, 3, 87),
        c(4, [7, 0, 0, 0, 0], Netherite, 3, 88),
        c(4, [6, 0, 3, 0, 3], Netherite, 3, 89),
        c(5, [7, 0, 0, 0, 3], Netherite, 3, 90),
    ]
}
