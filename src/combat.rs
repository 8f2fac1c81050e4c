//! Damage and healing.

use crate::stat_id::StatId;
use crate::stats::StatTable;
use serde::{Deserialize, Serialize};

/// What an HP change did to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HpTransition {
    /// HP moved (or did not) without crossing a boundary.
    None,
    /// HP went from positive to zero.
    Died,
    /// HP reached its maximum from below.
    FullHealth,
}

/// Applies HP changes to a [`StatTable`].
///
/// Amounts are taken by magnitude. The resulting HP always satisfies
/// `0 <= HpCur <= HpMax`.
///
/// # Examples
///
/// ```rust
/// use wavecore::{CombatResolver, HpTransition, StatId, StatTable};
///
/// let mut table = StatTable::new();
/// table.set_base(StatId::HpMax, 10);
/// table.restore_hp();
///
/// assert_eq!(CombatResolver::apply_damage(&mut table, 4), HpTransition::None);
/// assert_eq!(CombatResolver::apply_damage(&mut table, -20), HpTransition::Died);
/// assert_eq!(CombatResolver::apply_damage(&mut table, 5), HpTransition::None);
/// assert_eq!(table.base(StatId::HpCur), 0);
/// ```
pub struct CombatResolver;

impl CombatResolver {
    /// Subtract the magnitude of `amount` from current hit points, flooring at zero.
    pub fn apply_damage(table: &mut StatTable, amount: i32) -> HpTransition {
        let before = table.base(StatId::HpCur);
        let after = before.saturating_sub(amount.saturating_abs()).max(0);
        table.set_base(StatId::HpCur, after);

        if before > 0 && table.base(StatId::HpCur) == 0 {
            HpTransition::Died
        } else {
            HpTransition::None
        }
    }

    /// Add the magnitude of `amount` to current hit points, capping at the maximum.
    pub fn apply_heal(table: &mut StatTable, amount: i32) -> HpTransition {
        let before = table.base(StatId::HpCur);
        let max = table.base(StatId::HpMax);
        let after = before.saturating_add(amount.saturating_abs()).min(max);
        table.set_base(StatId::HpCur, after);

        if before < max && table.base(StatId::HpCur) == max {
            HpTransition::FullHealth
        } else {
            HpTransition::None
        }
    }
}
