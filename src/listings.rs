//! Listings
//!
//! Marketplace listing drafts from the "sell item" wizard and their eco score.

use std::{convert::Infallible, fmt, str::FromStr};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tags::TagSet;

/// Starting score for every listing.
pub const BASE_ECO_SCORE: u32 = 50;

/// Highest eco score a listing can reach.
pub const MAX_ECO_SCORE: u32 = 100;

/// Bonus for categories that favour reuse.
pub const REUSE_CATEGORY_BONUS: u32 = 20;

/// Bonus for each eco tag on a listing.
pub const ECO_TAG_BONUS: u32 = 5;

/// Errors raised while validating a listing draft.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    /// Condition did not match any accepted condition.
    #[error("unknown condition: {0}")]
    UnknownCondition(String),

    /// Listings need a title.
    #[error("listing title must not be blank")]
    MissingTitle,

    /// Listings need a positive price.
    #[error("listing price must be greater than zero")]
    InvalidPrice,
}

/// Item condition as declared by the seller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Unused
    New,

    /// Barely used
    Excellent,

    /// Visible wear
    Good,

    /// Heavy wear
    Fair,
}

impl Condition {
    /// Every condition, best first.
    pub const ALL: [Condition; 4] = [
        Condition::New,
        Condition::Excellent,
        Condition::Good,
        Condition::Fair,
    ];

    /// Eco score bonus for this condition.
    ///
    /// Worn items score higher than new ones.
    pub const fn bonus(self) -> u32 {
        match self {
            Condition::New => 70,
            Condition::Excellent => 85,
            Condition::Good => 90,
            Condition::Fair => 95,
        }
    }

    /// Stable identifier used in stored documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::Excellent => "excellent",
            Condition::Good => "good",
            Condition::Fair => "fair",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();

        Condition::ALL
            .into_iter()
            .find(|condition| condition.as_str() == normalized)
            .ok_or_else(|| ListingError::UnknownCondition(s.to_string()))
    }
}

/// Marketplace category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Clothing and accessories
    Fashion,

    /// Furniture
    Furniture,

    /// Homeware
    Home,

    /// Books
    Books,

    /// Electronics
    Electronics,

    /// Garden and outdoor
    Garden,

    /// Toys
    Toys,

    /// Sports equipment
    Sports,

    /// Any other category, kept verbatim
    Other(String),
}

impl Category {
    /// Parse a category name, ignoring case. Unknown names become [`Category::Other`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "fashion" => Category::Fashion,
            "furniture" => Category::Furniture,
            "home" => Category::Home,
            "books" => Category::Books,
            "electronics" => Category::Electronics,
            "garden" => Category::Garden,
            "toys" => Category::Toys,
            "sports" => Category::Sports,
            _ => Category::Other(s.trim().to_string()),
        }
    }

    /// Category name used in stored documents.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Fashion => "fashion",
            Category::Furniture => "furniture",
            Category::Home => "home",
            Category::Books => "books",
            Category::Electronics => "electronics",
            Category::Garden => "garden",
            Category::Toys => "toys",
            Category::Sports => "sports",
            Category::Other(name) => name,
        }
    }

    /// Whether listings in this category earn the reuse bonus.
    pub const fn favours_reuse(&self) -> bool {
        matches!(
            self,
            Category::Fashion | Category::Furniture | Category::Home | Category::Books
        )
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::parse(s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags that raise a listing's eco score.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EcoTag {
    /// Upcycled
    Upcycled,

    /// Recycled
    Recycled,

    /// Vintage
    Vintage,

    /// Sustainable
    Sustainable,

    /// Organic
    Organic,

    /// Handmade
    Handmade,
}

impl EcoTag {
    /// Every eco tag.
    pub const ALL: [EcoTag; 6] = [
        EcoTag::Upcycled,
        EcoTag::Recycled,
        EcoTag::Vintage,
        EcoTag::Sustainable,
        EcoTag::Organic,
        EcoTag::Handmade,
    ];

    /// Tag text as it appears on listings.
    pub const fn as_str(self) -> &'static str {
        match self {
            EcoTag::Upcycled => "upcycled",
            EcoTag::Recycled => "recycled",
            EcoTag::Vintage => "vintage",
            EcoTag::Sustainable => "sustainable",
            EcoTag::Organic => "organic",
            EcoTag::Handmade => "handmade",
        }
    }

    /// Match a free-form tag against the eco tags, ignoring case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();

        EcoTag::ALL
            .into_iter()
            .find(|eco_tag| eco_tag.as_str().eq_ignore_ascii_case(tag))
    }
}

/// Estimate the eco score of a listing.
///
/// Starts from [`BASE_ECO_SCORE`], adds the condition bonus, the reuse category
/// bonus and [`ECO_TAG_BONUS`] per eco tag, then clamps to [`MAX_ECO_SCORE`].
pub fn estimate(condition: Condition, category: &Category, tags: &TagSet) -> u8 {
    let category_bonus = if category.favours_reuse() {
        REUSE_CATEGORY_BONUS
    } else {
        0
    };

    let eco_tags = tags.iter().filter_map(EcoTag::from_tag).count();
    let tag_bonus = u32::try_from(eco_tags)
        .unwrap_or(u32::MAX)
        .saturating_mul(ECO_TAG_BONUS);

    let score = BASE_ECO_SCORE
        .saturating_add(condition.bonus())
        .saturating_add(category_bonus)
        .saturating_add(tag_bonus)
        .min(MAX_ECO_SCORE);

    u8::try_from(score).unwrap_or(u8::MAX)
}

/// Draft listing collected by the "sell item" wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft<'a> {
    title: String,
    description: String,
    price: Money<'a, Currency>,
    condition: Condition,
    category: Category,
    tags: TagSet,
}

impl<'a> ListingDraft<'a> {
    /// Create a new draft.
    ///
    /// # Errors
    ///
    /// - [`ListingError::MissingTitle`]: `title` is blank.
    /// - [`ListingError::InvalidPrice`]: `price` is not positive.
    pub fn new(
        title: impl Into<String>,
        price: Money<'a, Currency>,
        condition: Condition,
        category: Category,
        tags: TagSet,
    ) -> Result<Self, ListingError> {
        let title = title.into().trim().to_string();

        if title.is_empty() {
            return Err(ListingError::MissingTitle);
        }

        if price.to_minor_units() <= 0 {
            return Err(ListingError::InvalidPrice);
        }

        Ok(Self {
            title,
            description: String::new(),
            price,
            condition,
            category,
            tags,
        })
    }

    /// Set the free-form description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Listing title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Listing description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Asking price
    pub fn price(&self) -> Money<'a, Currency> {
        self.price
    }

    /// Declared condition
    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// Category
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Tags
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Eco score for this draft.
    pub fn eco_score(&self) -> u8 {
        estimate(self.condition, &self.category, &self.tags)
    }
}
