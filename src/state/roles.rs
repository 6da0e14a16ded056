//! Team role inference from the roster widget's role icons.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Icon id the host reports for a slot whose icon has not loaded yet.
pub const BLANK_ICON: u32 = 65535;

const ATTACKER_ICON: u32 = 20561;
const COLLECTOR_ICON: u32 = 20563;
const DEFENDER_ICON: u32 = 20566;
const HEALER_ICON: u32 = 20569;

/// Number of slots in the roster widget: the leader followed by four others.
pub const ROSTER_SLOTS: usize = 5;

/// Base role shown by a roster icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Attacker icon.
    Attacker,
    /// Defender icon.
    Defender,
    /// Collector icon.
    Collector,
    /// Healer icon.
    Healer,
    /// Icon not in the lookup table.
    Unknown,
}

impl Role {
    /// Resolve a role icon id.
    pub fn from_icon(icon: u32) -> Self {
        match icon {
            ATTACKER_ICON => Role::Attacker,
            DEFENDER_ICON => Role::Defender,
            COLLECTOR_ICON => Role::Collector,
            HEALER_ICON => Role::Healer,
            _ => Role::Unknown,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Role::Attacker => "Attacker",
            Role::Defender => "Defender",
            Role::Collector => "Collector",
            Role::Healer => "Healer",
            Role::Unknown => "",
        }
    }
}

/// Qualifier a formation adds on top of a base role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleQualifier {
    /// Played as part of a leech formation.
    Leech,
    /// Leading attacker.
    Main,
    /// Second attacker of a five-man team.
    Second,
}

/// Final role label for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleLabel {
    /// Role resolved from the icon.
    pub role: Role,
    /// Formation-specific qualifier.
    pub qualifier: Option<RoleQualifier>,
}

impl RoleLabel {
    /// Unqualified label for `role`.
    pub const fn plain(role: Role) -> Self {
        Self {
            role,
            qualifier: None,
        }
    }

    /// Label for `role` carrying `qualifier`.
    pub const fn qualified(role: Role, qualifier: RoleQualifier) -> Self {
        Self {
            role,
            qualifier: Some(qualifier),
        }
    }
}

impl fmt::Display for RoleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.qualifier, self.role) {
            (None, role) => f.write_str(role.as_str()),
            (Some(RoleQualifier::Leech), role) => write!(f, "Leech {}", role.as_str()),
            (Some(RoleQualifier::Main), role) => write!(f, "Main {}", role.as_str()),
            (Some(RoleQualifier::Second), role) => write!(f, "2nd {}", role.as_str()),
        }
    }
}

/// Recognised team composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Formation {
    /// Attacker, collector, healer and defender carrying a fifth participant.
    Leech,
    /// Two attackers, healer, collector and defender.
    FiveMan,
}

impl Formation {
    /// Wire tag of the formation.
    pub fn as_str(self) -> &'static str {
        match self {
            Formation::Leech => "leech",
            Formation::FiveMan => "five_man",
        }
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One slot of the roster widget as sampled from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSlot {
    /// Display name shown in the slot.
    pub name: String,
    /// Model id of the slot's role icon.
    pub icon: u32,
}

impl RosterSlot {
    /// Build a slot from a name and icon id.
    pub fn new(name: impl Into<String>, icon: u32) -> Self {
        Self {
            name: name.into(),
            icon,
        }
    }
}

/// Result of a completed role scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Detected formation, if the icons matched one.
    pub formation: Option<Formation>,
    /// Participants relevant to the formation, in slot order. Empty without a formation.
    pub roster: IndexMap<String, RoleLabel>,
    /// Label for the local participant, if they appear in the roster.
    pub local_role: Option<RoleLabel>,
    /// Whether the local participant holds the leader slot.
    pub is_leader: bool,
}

/// Rebuilds the team's roles from roster snapshots and keeps the latest complete result.
#[derive(Debug, Clone, Default)]
pub struct RoleInferenceEngine {
    current: Option<RoleAssignment>,
}

impl RoleInferenceEngine {
    /// Create an engine with no assignment yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest complete assignment.
    pub fn current(&self) -> Option<&RoleAssignment> {
        self.current.as_ref()
    }

    /// Forget the current assignment.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Run one scan. Returns the new assignment, or `None` when the icons have not loaded,
    /// in which case the previous assignment is kept.
    pub fn scan(
        &mut self,
        slots: &[RosterSlot; ROSTER_SLOTS],
        local_name: &str,
    ) -> Option<&RoleAssignment> {
        let Some(assignment) = infer(slots, local_name) else {
            trace!("roster icons not loaded yet; scan deferred");
            return None;
        };

        debug!(
            leader = %slots[0].name,
            formation = ?assignment.formation,
            local_role = ?assignment.local_role.map(|label| label.to_string()),
            is_leader = assignment.is_leader,
            "role scan complete"
        );
        self.current = Some(assignment);
        self.current.as_ref()
    }
}

/// Whether the roster icons have finished loading.
fn is_complete(slots: &[RosterSlot; ROSTER_SLOTS]) -> bool {
    let leader = slots[0].icon;
    let last = slots[ROSTER_SLOTS - 1].icon;
    leader != BLANK_ICON && last != BLANK_ICON && last != leader
}

fn detect_formation(roles: &[Role; ROSTER_SLOTS]) -> Option<Formation> {
    use Role::*;
    match roles {
        [Attacker, Collector, Healer, _, Defender] => Some(Formation::Leech),
        [Attacker, Attacker, Healer, Collector, Defender] => Some(Formation::FiveMan),
        _ => None,
    }
}

fn infer(slots: &[RosterSlot; ROSTER_SLOTS], local_name: &str) -> Option<RoleAssignment> {
    if !is_complete(slots) {
        return None;
    }

    let roles = slots.each_ref().map(|slot| Role::from_icon(slot.icon));
    let formation = detect_formation(&roles);

    let mut labels = roles.map(RoleLabel::plain);
    if formation == Some(Formation::FiveMan) {
        labels[0] = RoleLabel::qualified(Role::Attacker, RoleQualifier::Main);
        labels[1] = RoleLabel::qualified(Role::Attacker, RoleQualifier::Second);
    }

    let local_slot = slots.iter().position(|slot| slot.name == local_name);
    let is_leader = local_slot == Some(0);

    let local_role = local_slot.map(|index| {
        let label = labels[index];
        match formation {
            Some(Formation::Leech) => RoleLabel::qualified(label.role, RoleQualifier::Leech),
            _ if is_leader && label.role == Role::Attacker => {
                RoleLabel::qualified(Role::Attacker, RoleQualifier::Main)
            }
            _ => label,
        }
    });

    let included: &[usize] = match formation {
        Some(Formation::FiveMan) => &[0, 1, 2, 3, 4],
        Some(Formation::Leech) => &[0, 1, 2, 4],
        None => &[],
    };
    let roster = included
        .iter()
        .map(|&index| (slots[index].name.clone(), labels[index]))
        .collect();

    Some(RoleAssignment {
        formation,
        roster,
        local_role,
        is_leader,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(icons: [u32; ROSTER_SLOTS]) -> [RosterSlot; ROSTER_SLOTS] {
        let names = ["Lead", "Ana", "Bo", "Cy", "Dee"];
        std::array::from_fn(|i| RosterSlot::new(names[i], icons[i]))
    }

    fn labels(assignment: &RoleAssignment) -> Vec<(String, String)> {
        assignment
            .roster
            .iter()
            .map(|(name, label)| (name.clone(), label.to_string()))
            .collect()
    }

    #[test]
    fn leech_formation_omits_fourth_slot() {
        let slots = roster([
            ATTACKER_ICON,
            COLLECTOR_ICON,
            HEALER_ICON,
            ATTACKER_ICON,
            DEFENDER_ICON,
        ]);
        let mut engine = RoleInferenceEngine::new();
        let assignment = engine.scan(&slots, "Bo").unwrap();

        assert_eq!(assignment.formation, Some(Formation::Leech));
        assert_eq!(assignment.roster.len(), 4);
        assert!(!assignment.roster.contains_key("Cy"));
        assert_eq!(assignment.local_role.unwrap().to_string(), "Leech Healer");
        assert!(!assignment.is_leader);
    }

    #[test]
    fn leech_leader_is_not_promoted_to_main() {
        let slots = roster([
            ATTACKER_ICON,
            COLLECTOR_ICON,
            HEALER_ICON,
            HEALER_ICON,
            DEFENDER_ICON,
        ]);
        let mut engine = RoleInferenceEngine::new();
        let assignment = engine.scan(&slots, "Lead").unwrap();
        assert!(assignment.is_leader);
        assert_eq!(assignment.local_role.unwrap().to_string(), "Leech Attacker");
    }

    #[test]
    fn five_man_formation_labels_both_attackers() {
        let slots = roster([
            ATTACKER_ICON,
            ATTACKER_ICON,
            HEALER_ICON,
            COLLECTOR_ICON,
            DEFENDER_ICON,
        ]);
        let mut engine = RoleInferenceEngine::new();
        let assignment = engine.scan(&slots, "Ana").unwrap();

        assert_eq!(assignment.formation, Some(Formation::FiveMan));
        assert_eq!(
            labels(assignment),
            vec![
                ("Lead".to_string(), "Main Attacker".to_string()),
                ("Ana".to_string(), "2nd Attacker".to_string()),
                ("Bo".to_string(), "Healer".to_string()),
                ("Cy".to_string(), "Collector".to_string()),
                ("Dee".to_string(), "Defender".to_string()),
            ]
        );
        assert_eq!(assignment.local_role.unwrap().to_string(), "2nd Attacker");
    }

    #[test]
    fn unknown_formation_keeps_local_role_but_no_roster() {
        let slots = roster([
            ATTACKER_ICON,
            DEFENDER_ICON,
            HEALER_ICON,
            COLLECTOR_ICON,
            ATTACKER_ICON + 1,
        ]);
        let mut engine = RoleInferenceEngine::new();
        let assignment = engine.scan(&slots, "Lead").unwrap();

        assert_eq!(assignment.formation, None);
        assert!(assignment.roster.is_empty());
        assert!(assignment.is_leader);
        assert_eq!(assignment.local_role.unwrap().to_string(), "Main Attacker");
    }

    #[test]
    fn label_text_follows_qualifier() {
        let cases = [
            (RoleLabel::plain(Role::Healer), "Healer"),
            (RoleLabel::qualified(Role::Defender, RoleQualifier::Leech), "Leech Defender"),
            (RoleLabel::qualified(Role::Attacker, RoleQualifier::Main), "Main Attacker"),
            (RoleLabel::qualified(Role::Attacker, RoleQualifier::Second), "2nd Attacker"),
        ];
        for (label, text) in cases {
            assert_eq!(label.to_string(), text);
        }
    }

    #[test]
    fn unknown_icon_resolves_to_empty_label() {
        assert_eq!(Role::from_icon(1234), Role::Unknown);
        assert_eq!(RoleLabel::plain(Role::Unknown).to_string(), "");
    }

    #[test]
    fn incomplete_scan_keeps_previous_assignment() {
        let mut engine = RoleInferenceEngine::new();
        let complete = roster([
            ATTACKER_ICON,
            ATTACKER_ICON,
            HEALER_ICON,
            COLLECTOR_ICON,
            DEFENDER_ICON,
        ]);
        engine.scan(&complete, "Lead").unwrap();
        let before = engine.current().cloned();

        let blank_last = roster([
            ATTACKER_ICON,
            COLLECTOR_ICON,
            HEALER_ICON,
            COLLECTOR_ICON,
            BLANK_ICON,
        ]);
        assert!(engine.scan(&blank_last, "Lead").is_none());

        let repeated = roster([
            DEFENDER_ICON,
            COLLECTOR_ICON,
            HEALER_ICON,
            COLLECTOR_ICON,
            DEFENDER_ICON,
        ]);
        assert!(engine.scan(&repeated, "Lead").is_none());

        let blank_leader = roster([
            BLANK_ICON,
            COLLECTOR_ICON,
            HEALER_ICON,
            COLLECTOR_ICON,
            DEFENDER_ICON,
        ]);
        assert!(engine.scan(&blank_leader, "Lead").is_none());
        assert_eq!(engine.current().cloned(), before);
    }

    #[test]
    fn absent_local_participant_has_no_role() {
        let slots = roster([
            ATTACKER_ICON,
            ATTACKER_ICON,
            HEALER_ICON,
            COLLECTOR_ICON,
            DEFENDER_ICON,
        ]);
        let mut engine = RoleInferenceEngine::new();
        let assignment = engine.scan(&slots, "Spectator").unwrap();
        assert_eq!(assignment.local_role, None);
        assert!(!assignment.is_leader);
        assert_eq!(assignment.roster.len(), 5);
    }
}
