//! Fault kinds and fault sets
//!
//! A fault is a persistent deviation from acceptable squat form. Kinds are a
//! closed set, declared in feedback priority order:
//! - Depth: too shallow, too deep
//! - Alignment: knee travel, ankle flexion, camera misalignment
//! - Posture: torso lean
//! - General: inactivity

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of form fault
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FaultKind {
    /// Descent returned to standing without reaching the bottom band
    TooShallow = 0,
    /// Hip-knee angle went past the deepest knee threshold
    TooDeep = 1,
    /// Knee closed below the first knee threshold (knee travelling forward)
    KneeAlignment = 2,
    /// Shank leaning past the ankle threshold (knee falling over toes)
    AnkleFlexion = 3,
    /// Shoulders not in profile relative to the camera
    Misaligned = 4,
    /// Torso leaning forward past the upper hip threshold
    ExcessiveLean = 5,
    /// Torso too upright, under the lower hip threshold
    InsufficientLean = 6,
    /// No posture change for longer than the inactivity threshold
    Inactive = 7,
}

/// Broad feedback category of a fault
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    Depth,
    Alignment,
    Posture,
    General,
}

impl FaultKind {
    /// Number of fault kinds
    pub const COUNT: usize = 8;

    /// All fault kinds, highest feedback priority first
    pub fn all() -> &'static [FaultKind] {
        &[
            FaultKind::TooShallow,
            FaultKind::TooDeep,
            FaultKind::KneeAlignment,
            FaultKind::AnkleFlexion,
            FaultKind::Misaligned,
            FaultKind::ExcessiveLean,
            FaultKind::InsufficientLean,
            FaultKind::Inactive,
        ]
    }

    pub fn count() -> usize {
        Self::COUNT
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::all().get(idx).copied()
    }

    /// Priority for feedback selection (lower = higher priority)
    #[inline]
    pub fn priority(self) -> u8 {
        self as u8
    }

    pub fn category(self) -> FaultCategory {
        match self {
            FaultKind::TooShallow | FaultKind::TooDeep => FaultCategory::Depth,
            FaultKind::KneeAlignment | FaultKind::AnkleFlexion | FaultKind::Misaligned => {
                FaultCategory::Alignment
            }
            FaultKind::ExcessiveLean | FaultKind::InsufficientLean => FaultCategory::Posture,
            FaultKind::Inactive => FaultCategory::General,
        }
    }

    /// Does this fault need to persist over consecutive frames before it is raised?
    ///
    /// Shallow reps and inactivity are judged over a whole rep or a time span
    /// and are raised as soon as they are detected.
    pub fn is_frame_fault(self) -> bool {
        !matches!(self, FaultKind::TooShallow | FaultKind::Inactive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::TooShallow => "too_shallow",
            FaultKind::TooDeep => "too_deep",
            FaultKind::KneeAlignment => "knee_alignment",
            FaultKind::AnkleFlexion => "ankle_flexion",
            FaultKind::Misaligned => "misaligned",
            FaultKind::ExcessiveLean => "excessive_lean",
            FaultKind::InsufficientLean => "insufficient_lean",
            FaultKind::Inactive => "inactive",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of fault kinds, iterated in priority order
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<FaultKind>", from = "Vec<FaultKind>")]
pub struct FaultSet(u16);

impl FaultSet {
    pub const EMPTY: FaultSet = FaultSet(0);

    #[inline]
    pub fn new() -> Self {
        Self::EMPTY
    }

    #[inline]
    pub fn insert(&mut self, kind: FaultKind) {
        self.0 |= 1 << kind.index();
    }

    #[inline]
    pub fn remove(&mut self, kind: FaultKind) {
        self.0 &= !(1 << kind.index());
    }

    #[inline]
    pub fn contains(&self, kind: FaultKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: FaultSet) -> FaultSet {
        FaultSet(self.0 | other.0)
    }

    /// Highest-priority fault in the set
    pub fn highest_priority(&self) -> Option<FaultKind> {
        self.iter().next()
    }

    /// Iterate in priority order
    pub fn iter(&self) -> impl Iterator<Item = FaultKind> + '_ {
        FaultKind::all().iter().copied().filter(|k| self.contains(*k))
    }
}

impl FromIterator<FaultKind> for FaultSet {
    fn from_iter<I: IntoIterator<Item = FaultKind>>(iter: I) -> Self {
        let mut set = FaultSet::new();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl From<Vec<FaultKind>> for FaultSet {
    fn from(kinds: Vec<FaultKind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<FaultSet> for Vec<FaultKind> {
    fn from(set: FaultSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for FaultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fault_index_roundtrip() {
        assert_eq!(FaultKind::all().len(), FaultKind::COUNT);
        assert_eq!(FaultKind::Inactive.index() + 1, FaultKind::COUNT);
        for (i, kind) in FaultKind::all().iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(FaultKind::from_index(i), Some(*kind));
        }
        assert_eq!(FaultKind::from_index(FaultKind::count()), None);
    }

    #[test]
    fn test_category_priority_ordering() {
        // Depth before alignment before posture before generic reminders
        let categories: Vec<_> = FaultKind::all().iter().map(|k| k.category()).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
    }

    #[test]
    fn test_fault_set_priority_iteration() {
        let set: FaultSet = [
            FaultKind::Inactive,
            FaultKind::ExcessiveLean,
            FaultKind::TooDeep,
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 3);
        assert_eq!(set.highest_priority(), Some(FaultKind::TooDeep));
        let order: Vec<_> = set.iter().collect();
        assert_eq!(
            order,
            vec![FaultKind::TooDeep, FaultKind::ExcessiveLean, FaultKind::Inactive]
        );
    }

    #[test]
    fn test_fault_set_insert_remove() {
        let mut set = FaultSet::new();
        assert!(set.is_empty());
        set.insert(FaultKind::Misaligned);
        set.insert(FaultKind::Misaligned);
        assert_eq!(set.len(), 1);
        set.remove(FaultKind::Misaligned);
        assert!(set.is_empty());
        assert_eq!(set.highest_priority(), None);
    }

    #[test]
    fn test_frame_fault_classification() {
        assert!(!FaultKind::TooShallow.is_frame_fault());
        assert!(!FaultKind::Inactive.is_frame_fault());
        assert!(FaultKind::KneeAlignment.is_frame_fault());
        assert!(FaultKind::Misaligned.is_frame_fault());
    }

    fn kinds() -> impl Strategy<Value = Vec<FaultKind>> {
        proptest::collection::vec(0..FaultKind::count(), 0..12).prop_map(|idx| {
            idx.into_iter().filter_map(FaultKind::from_index).collect()
        })
    }

    proptest! {
        #[test]
        fn prop_highest_priority_is_minimum(kinds in kinds()) {
            let set: FaultSet = kinds.iter().copied().collect();
            prop_assert_eq!(set.highest_priority(), kinds.iter().copied().min());
        }

        #[test]
        fn prop_iteration_sorted_and_deduplicated(kinds in kinds()) {
            let set: FaultSet = kinds.iter().copied().collect();
            let mut expected = kinds.clone();
            expected.sort();
            expected.dedup();
            prop_assert_eq!(set.iter().collect::<Vec<_>>(), expected);
            prop_assert_eq!(set.len(), set.iter().count());
        }
    }
}
