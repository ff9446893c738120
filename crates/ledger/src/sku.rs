use core::str::FromStr;

use serde::{Deserialize, Serialize};

use tally_core::{DomainError, DomainResult, Money, OwnerId, SkuId, ValidationErrors};

use crate::patch::merge;

/// Product category of a SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Print,
    Keychain,
    Sticker,
    Other,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Print => "print",
            ItemType::Keychain => "keychain",
            ItemType::Sticker => "sticker",
            ItemType::Other => "other",
        }
    }
}

impl core::fmt::Display for ItemType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "print" => Ok(ItemType::Print),
            "keychain" => Ok(ItemType::Keychain),
            "sticker" => Ok(ItemType::Sticker),
            "other" => Ok(ItemType::Other),
            _ => Err(DomainError::validation(
                "item_type",
                "must be one of: print, keychain, sticker, other",
            )),
        }
    }
}

/// A sellable product definition.
///
/// `(owner, name, item_type)` is unique; the store enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub id: SkuId,
    pub owner: OwnerId,
    pub name: String,
    pub item_type: ItemType,
    #[serde(default)]
    pub default_price: Money,
    #[serde(default)]
    pub default_cost: Money,
}

/// Input: create a SKU. Prices default to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSku {
    pub name: String,
    pub item_type: ItemType,
    #[serde(default)]
    pub default_price: Money,
    #[serde(default)]
    pub default_cost: Money,
}

impl NewSku {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "must not be blank");
        }
        if let Some(problem) = self.default_price.input_problem() {
            errors.push("default_price", problem);
        }
        if let Some(problem) = self.default_cost.input_problem() {
            errors.push("default_cost", problem);
        }
        errors.into_result()
    }

    pub fn into_sku(self, id: SkuId, owner: OwnerId) -> DomainResult<Sku> {
        self.validate()?;
        Ok(Sku {
            id,
            owner,
            name: self.name.trim().to_string(),
            item_type: self.item_type,
            default_price: self.default_price,
            default_cost: self.default_cost,
        })
    }
}

/// Input: partial update of a SKU.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub item_type: Option<ItemType>,
    #[serde(default)]
    pub default_price: Option<Money>,
    #[serde(default)]
    pub default_cost: Option<Money>,
}

impl Sku {
    /// Re-checks a stored SKU against the create-time rules.
    pub fn validate(&self) -> DomainResult<()> {
        NewSku {
            name: self.name.clone(),
            item_type: self.item_type,
            default_price: self.default_price,
            default_cost: self.default_cost,
        }
        .validate()
    }

    pub fn patched(&self, patch: &SkuPatch) -> DomainResult<Sku> {
        let merged = NewSku {
            name: merge(&patch.name, &self.name),
            item_type: merge(&patch.item_type, &self.item_type),
            default_price: merge(&patch.default_price, &self.default_price),
            default_cost: merge(&patch.default_cost, &self.default_cost),
        };
        merged.into_sku(self.id, self.owner.clone())
    }

    /// Whether `other` collides with this SKU on the `(owner, name, item_type)` key.
    pub fn same_identity(&self, other: &Sku) -> bool {
        self.owner == other.owner && self.item_type == other.item_type && self.name == other.name
    }
}
