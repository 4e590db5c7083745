use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Attribute {
    Cute = 0,
    Cool = 1,
    Pure = 2,
    Happy = 3,
    Mysterious = 4,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Cute,
        Attribute::Cool,
        Attribute::Pure,
        Attribute::Happy,
        Attribute::Mysterious,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Attribute::Cute),
            1 => Some(Attribute::Cool),
            2 => Some(Attribute::Pure),
            3 => Some(Attribute::Happy),
            4 => Some(Attribute::Mysterious),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Attribute::Cute => "cute",
            Attribute::Cool => "cool",
            Attribute::Pure => "pure",
            Attribute::Happy => "happy",
            Attribute::Mysterious => "mysterious",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Attribute;

    #[test]
    fn from_index_maps_valid_values() {
        assert_eq!(Attribute::from_index(4), Some(Attribute::Mysterious));
        assert_eq!(Attribute::from_index(5), None);
    }

    #[test]
    fn deserializes_master_data_spelling() {
        let attr: Attribute = serde_json::from_str("\"mysterious\"").unwrap();
        assert_eq!(attr, Attribute::Mysterious);
        assert_eq!(attr.to_string(), "mysterious");
    }
}
