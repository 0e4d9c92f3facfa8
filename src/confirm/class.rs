use std::fmt;

use crate::detect::Detection;

/// Wildfire indicators the engine keeps a counter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitoredClass {
    Smoke,
    Fire,
}

impl MonitoredClass {
    /// Every monitored class, in counter order.
    pub const ALL: [MonitoredClass; 2] = [MonitoredClass::Smoke, MonitoredClass::Fire];

    /// Case-insensitive match of a detector label. Surrounding whitespace is ignored.
    ///
    /// # Examples
    /// ```
    /// use emberwatch::MonitoredClass;
    ///
    /// assert_eq!(MonitoredClass::from_label("SMOKE"), Some(MonitoredClass::Smoke));
    /// assert_eq!(MonitoredClass::from_label("fire "), Some(MonitoredClass::Fire));
    /// assert_eq!(MonitoredClass::from_label("person"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("smoke") {
            Some(Self::Smoke)
        } else if label.eq_ignore_ascii_case("fire") {
            Some(Self::Fire)
        } else {
            None
        }
    }

    /// Display name used in subjects and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smoke => "Smoke",
            Self::Fire => "Fire",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Smoke => 0,
            Self::Fire => 1,
        }
    }
}

impl fmt::Display for MonitoredClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of monitored classes, iterated in [`MonitoredClass::ALL`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassSet {
    present: [bool; 2],
}

impl ClassSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Monitored classes among a detector's labels.
    pub fn from_detections(detections: &[Detection]) -> Self {
        detections
            .iter()
            .filter_map(|d| MonitoredClass::from_label(&d.class_name))
            .collect()
    }

    pub fn insert(&mut self, class: MonitoredClass) {
        self.present[class.index()] = true;
    }

    pub fn contains(&self, class: MonitoredClass) -> bool {
        self.present[class.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.present.iter().any(|p| *p)
    }

    pub fn len(&self) -> usize {
        self.present.iter().filter(|p| **p).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = MonitoredClass> + '_ {
        MonitoredClass::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<MonitoredClass> for ClassSet {
    fn from_iter<I: IntoIterator<Item = MonitoredClass>>(iter: I) -> Self {
        let mut set = ClassSet::empty();
        for class in iter {
            set.insert(class);
        }
        set
    }
}
