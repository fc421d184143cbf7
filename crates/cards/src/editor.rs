use crate::models::{BenefitField, BenefitRow, Card, Direction};

/// Pure list operations over the card collection. Every method returns a new
/// collection (or card) and leaves its input untouched.
pub struct CollectionEditor;

impl CollectionEditor {
    /// Timestamp-based id, bumped until it does not collide with `taken`.
    pub fn fresh_id(now_millis: i64, taken: impl Fn(&str) -> bool) -> String {
        let mut candidate = now_millis;
        while taken(&candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    pub fn next_card_id(cards: &[Card]) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        Self::fresh_id(now, |id| cards.iter().any(|c| c.id == id))
    }

    pub fn create(cards: &[Card]) -> Vec<Card> {
        let mut next = cards.to_vec();
        next.push(Card::blank(Self::next_card_id(cards)));
        next
    }

    /// Replaces the card with the same id, or appends it when there is none.
    pub fn update(cards: &[Card], card: Card) -> Vec<Card> {
        if cards.iter().any(|c| c.id == card.id) {
            cards
                .iter()
                .map(|c| if c.id == card.id { card.clone() } else { c.clone() })
                .collect()
        } else {
            let mut next = cards.to_vec();
            next.push(card);
            next
        }
    }

    pub fn remove(cards: &[Card], id: &str) -> Vec<Card> {
        cards.iter().filter(|c| c.id != id).cloned().collect()
    }

    /// Swaps the card at `index` with its neighbour. Out-of-bounds moves are no-ops.
    pub fn reorder(cards: &[Card], index: usize, direction: Direction) -> Vec<Card> {
        let mut next = cards.to_vec();
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        if let Some(target) = target {
            if index < next.len() && target < next.len() {
                next.swap(index, target);
            }
        }
        next
    }

    pub fn add_row(card: &Card) -> Card {
        let now = chrono::Utc::now().timestamp_millis();
        let id = Self::fresh_id(now, |candidate| {
            card.benefits.iter().any(|b| b.id == format!("b-{candidate}"))
        });
        let mut next = card.clone();
        next.benefits.push(BenefitRow::empty(format!("b-{id}")));
        next
    }

    /// Drops the row at `index`, refusing to remove the last remaining row.
    pub fn remove_row(card: &Card, index: usize) -> Card {
        let mut next = card.clone();
        if next.benefits.len() > 1 && index < next.benefits.len() {
            next.benefits.remove(index);
        }
        next
    }

    pub fn update_field(card: &Card, index: usize, field: BenefitField, value: &str) -> Card {
        let mut next = card.clone();
        if let Some(row) = next.benefits.get_mut(index) {
            match field {
                BenefitField::Performance => row.performance = value.to_string(),
                BenefitField::Discount => row.discount = value.to_string(),
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    fn abc() -> Vec<Card> {
        vec![Card::blank("a"), Card::blank("b"), Card::blank("c")]
    }

    #[test]
    fn test_fresh_id_skips_taken_values() {
        let id = CollectionEditor::fresh_id(100, |c| c == "100" || c == "101");
        assert_eq!(id, "102");
    }

    #[test]
    fn test_create_appends_blank_card() {
        let cards = abc();
        let next = CollectionEditor::create(&cards);
        assert_eq!(next.len(), 4);
        assert_eq!(cards.len(), 3);
        let created = next.last().unwrap();
        assert!(created.name.is_empty());
        assert_eq!(created.benefits.len(), 1);
        assert!(!ids(&cards).contains(&created.id.as_str()));
    }

    #[test]
    fn test_create_then_update_does_not_duplicate() {
        let created = CollectionEditor::create(&abc());
        let mut edited = created.last().unwrap().clone();
        edited.name = "Updated".into();

        let next = CollectionEditor::update(&created, edited.clone());
        assert_eq!(next.len(), created.len());
        assert_eq!(next.last().unwrap(), &edited);
    }

    #[test]
    fn test_update_unknown_id_appends() {
        let next = CollectionEditor::update(&abc(), Card::blank("d"));
        assert_eq!(ids(&next), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let cards = abc();
        assert_eq!(CollectionEditor::remove(&cards, "zzz"), cards);
        assert_eq!(ids(&CollectionEditor::remove(&cards, "b")), vec!["a", "c"]);
    }

    #[test]
    fn test_reorder_up_swaps_with_predecessor() {
        let next = CollectionEditor::reorder(&abc(), 1, Direction::Up);
        assert_eq!(ids(&next), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reorder_up_then_down_restores_order() {
        let cards = abc();
        let moved = CollectionEditor::reorder(&cards, 2, Direction::Up);
        let restored = CollectionEditor::reorder(&moved, 1, Direction::Down);
        assert_eq!(restored, cards);
    }

    #[test]
    fn test_reorder_out_of_bounds_is_noop() {
        let cards = abc();
        assert_eq!(CollectionEditor::reorder(&cards, 0, Direction::Up), cards);
        assert_eq!(CollectionEditor::reorder(&cards, 2, Direction::Down), cards);
        assert_eq!(CollectionEditor::reorder(&cards, 7, Direction::Up), cards);
    }

    #[test]
    fn test_row_operations() {
        let card = Card::blank("a");
        let two = CollectionEditor::add_row(&card);
        assert_eq!(two.benefits.len(), 2);
        assert_ne!(two.benefits[0].id, two.benefits[1].id);

        let filled = CollectionEditor::update_field(&two, 1, BenefitField::Discount, "5,000원");
        assert_eq!(filled.benefits[1].discount, "5,000원");
        assert_eq!(filled.benefits[1].performance, "");

        let one = CollectionEditor::remove_row(&filled, 0);
        assert_eq!(one.benefits.len(), 1);
        assert_eq!(one.benefits[0].discount, "5,000원");
    }

    #[test]
    fn test_remove_row_keeps_last_row() {
        let card = Card::blank("a");
        assert_eq!(CollectionEditor::remove_row(&card, 0), card);
    }
}
