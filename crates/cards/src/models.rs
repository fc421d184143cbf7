use serde::{Deserialize, Serialize};

/// Placeholder image shown on a card that has not had one uploaded yet.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://picsum.photos/400/250";

/// Id given to the first benefit row of a freshly created card.
pub const INITIAL_ROW_ID: &str = "b-init";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BenefitRow {
    pub id: String,
    /// Spending threshold, e.g. "30만원 이상".
    pub performance: String,
    /// Reward for reaching the threshold, e.g. "15,000원 할인".
    pub discount: String,
}

impl BenefitRow {
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            performance: String::new(),
            discount: String::new(),
        }
    }
}

/// One affiliate credit-card listing. Field names on the wire are camelCase.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    pub condition: String,
    pub annual_fee: String,
    pub apply_url: String,
    pub image_url: String,
    #[serde(default)]
    pub benefits: Vec<BenefitRow>,
}

impl Card {
    /// A new card with empty text fields and a single empty benefit row.
    pub fn blank(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            condition: String::new(),
            annual_fee: String::new(),
            apply_url: String::new(),
            image_url: PLACEHOLDER_IMAGE_URL.to_string(),
            benefits: vec![BenefitRow::empty(INITIAL_ROW_ID)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenefitField {
    Performance,
    Discount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// An image submitted from the admin form, before it is stored anywhere.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Text after the last `.` of the file name, or the whole name if it has none.
    pub fn extension(&self) -> &str {
        self.file_name.rsplit('.').next().unwrap_or(&self.file_name)
    }
}

/// The sample collection shown when neither backend has anything stored.
pub fn default_collection() -> Vec<Card> {
    vec![Card {
        id: "sample-1".into(),
        name: "KT 현대카드 M Edition3".into(),
        condition: "전월 실적 30만원 이상 시".into(),
        annual_fee: "국내전용 30,000원 / 해외겸용 30,000원".into(),
        apply_url: "https://www.hyundaicard.com".into(),
        image_url: "https://picsum.photos/seed/ktcard1/400/250".into(),
        benefits: vec![
            BenefitRow {
                id: "b1".into(),
                performance: "30만원 이상".into(),
                discount: "15,000원 할인".into(),
            },
            BenefitRow {
                id: "b2".into(),
                performance: "70만원 이상".into(),
                discount: "20,000원 할인".into(),
            },
            BenefitRow {
                id: "b3".into(),
                performance: "프로모션 추가".into(),
                discount: "5,000원 캐시백".into(),
            },
        ],
    }]
}
