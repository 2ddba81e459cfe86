use crate::model::call::Strain;
use crate::model::contract::{Contract, Doubled};

/// Duplicate score for declarer's side given the tricks declarer took.
/// Negative when the contract fails.
pub fn contract_score(contract: &Contract, declarer_tricks: u8, vulnerable: bool) -> i32 {
    let target = i32::from(contract.target_tricks());
    let taken = i32::from(declarer_tricks);
    if taken < target {
        -undertrick_penalty(contract.doubled, target - taken, vulnerable)
    } else {
        making_score(contract, taken - target, vulnerable)
    }
}

fn trick_value(strain: Strain) -> i32 {
    if strain.is_minor() { 20 } else { 30 }
}

fn making_score(contract: &Contract, overtricks: i32, vulnerable: bool) -> i32 {
    let level = i32::from(contract.level);
    let base = match contract.strain {
        Strain::NoTrump => 40 + (level - 1) * 30,
        strain => level * trick_value(strain),
    };
    let contract_points = match contract.doubled {
        Doubled::Undoubled => base,
        Doubled::Doubled => base * 2,
        Doubled::Redoubled => base * 4,
    };

    let level_bonus = if contract_points >= 100 {
        if vulnerable { 500 } else { 300 }
    } else {
        50
    };

    let slam_bonus = match (contract.level, vulnerable) {
        (6, false) => 500,
        (6, true) => 750,
        (7, false) => 1000,
        (7, true) => 1500,
        _ => 0,
    };

    let (overtrick_each, insult) = match contract.doubled {
        Doubled::Undoubled => (trick_value(contract.strain), 0),
        Doubled::Doubled => (if vulnerable { 200 } else { 100 }, 50),
        Doubled::Redoubled => (if vulnerable { 400 } else { 200 }, 100),
    };

    contract_points + level_bonus + slam_bonus + overtricks * overtrick_each + insult
}

fn undertrick_penalty(doubled: Doubled, undertricks: i32, vulnerable: bool) -> i32 {
    let doubled_penalty = || {
        if vulnerable {
            200 + (undertricks - 1) * 300
        } else {
            match undertricks {
                1 => 100,
                2 => 300,
                n => 500 + (n - 3) * 300,
            }
        }
    };
    match doubled {
        Doubled::Undoubled => undertricks * if vulnerable { 100 } else { 50 },
        Doubled::Doubled => doubled_penalty(),
        Doubled::Redoubled => doubled_penalty() * 2,
    }
}
