use crate::model::UnitType;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of unit types present in a group.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct UnitTypes: u8 {
        const ARRV = 1 << 0;
        const FIGHTER = 1 << 1;
        const HELICOPTER = 1 << 2;
        const IFV = 1 << 3;
        const TANK = 1 << 4;
    }
}

impl From<UnitType> for UnitTypes {
    fn from(unit_type: UnitType) -> UnitTypes {
        match unit_type {
            UnitType::Arrv => UnitTypes::ARRV,
            UnitType::Fighter => UnitTypes::FIGHTER,
            UnitType::Helicopter => UnitTypes::HELICOPTER,
            UnitType::Ifv => UnitTypes::IFV,
            UnitType::Tank => UnitTypes::TANK,
        }
    }
}

impl FromIterator<UnitType> for UnitTypes {
    fn from_iter<I: IntoIterator<Item = UnitType>>(iter: I) -> UnitTypes {
        iter.into_iter().fold(UnitTypes::empty(), |set, t| set | UnitTypes::from(t))
    }
}

/// How a squadron of one type should treat an enemy group of another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyCategory {
    Attack,
    Avoid,
    Ignore,
}

pub fn strong_against(mine: UnitType, enemy: UnitType) -> bool {
    match enemy {
        UnitType::Fighter | UnitType::Helicopter => matches!(mine, UnitType::Ifv | UnitType::Fighter),
        UnitType::Ifv | UnitType::Tank => matches!(mine, UnitType::Helicopter | UnitType::Tank),
        UnitType::Arrv => !matches!(mine, UnitType::Arrv | UnitType::Fighter),
    }
}

pub fn weak_against(mine: UnitType, enemy: UnitType) -> bool {
    match enemy {
        UnitType::Ifv | UnitType::Fighter => mine.is_aerial(),
        UnitType::Helicopter | UnitType::Tank => mine.is_ground(),
        UnitType::Arrv => false,
    }
}

/// Unit pairs that cannot hurt each other in either direction worth acting on.
pub fn ignores(mine: UnitType, enemy: UnitType) -> bool {
    if enemy.is_ground() {
        mine == UnitType::Fighter
    } else if enemy == UnitType::Fighter {
        mine == UnitType::Tank
    } else {
        false
    }
}

pub fn enemy_category(mine: UnitType, enemy: UnitType) -> EnemyCategory {
    if ignores(mine, enemy) {
        EnemyCategory::Ignore
    } else if strong_against(mine, enemy) {
        EnemyCategory::Attack
    } else if weak_against(mine, enemy) {
        EnemyCategory::Avoid
    } else {
        EnemyCategory::Attack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fighters_ignore_ground_targets() {
        assert_eq!(enemy_category(UnitType::Fighter, UnitType::Tank), EnemyCategory::Ignore);
        assert_eq!(enemy_category(UnitType::Fighter, UnitType::Arrv), EnemyCategory::Ignore);
        assert_eq!(enemy_category(UnitType::Fighter, UnitType::Helicopter), EnemyCategory::Attack);
    }

    #[test]
    fn helicopters_avoid_ifvs_and_hunt_tanks() {
        assert_eq!(enemy_category(UnitType::Helicopter, UnitType::Ifv), EnemyCategory::Attack);
        assert_eq!(enemy_category(UnitType::Helicopter, UnitType::Fighter), EnemyCategory::Avoid);
        assert_eq!(enemy_category(UnitType::Helicopter, UnitType::Tank), EnemyCategory::Attack);
    }

    #[test]
    fn ground_units_avoid_helicopters_unless_strong() {
        assert_eq!(enemy_category(UnitType::Tank, UnitType::Helicopter), EnemyCategory::Avoid);
        assert_eq!(enemy_category(UnitType::Ifv, UnitType::Helicopter), EnemyCategory::Attack);
        assert_eq!(enemy_category(UnitType::Arrv, UnitType::Tank), EnemyCategory::Avoid);
    }

    #[test]
    fn type_set_collects_members() {
        let set: UnitTypes = vec![UnitType::Tank, UnitType::Arrv, UnitType::Tank].into_iter().collect();
        assert_eq!(set, UnitTypes::TANK | UnitTypes::ARRV);
        assert_eq!(set.bits().count_ones(), 2);
    }
}
