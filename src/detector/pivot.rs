use crate::error::ExtractionError;
use crate::types::{Outcome, Row, Trend};

/// Locate the first row whose value did not change since yesterday and read
/// the (value, trend) pairs of the two rows right after it.
///
/// Single forward pass; rows past the second follower are never inspected.
/// A pivot without two followers is rejected rather than partially applied.
pub fn extract(rows: &[Row]) -> Result<Outcome, ExtractionError> {
    let mut iter = rows.iter();

    let pivot = iter
        .by_ref()
        .find(|r| r.trend == Trend::Flat)
        .ok_or(ExtractionError::NotFound)?;
    let next1 = iter.next().ok_or(ExtractionError::Truncated)?;
    let next2 = iter.next().ok_or(ExtractionError::Truncated)?;

    Ok(Outcome {
        pivot_item_id: pivot.item_id.clone(),
        pivot_item_url: pivot.item_url.clone(),
        pivot_value: pivot.value,
        next1_value: next1.value,
        next1_trend: next1.trend,
        next2_value: next2.value,
        next2_trend: next2.trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, value: u32, trend: Trend) -> Row {
        Row {
            item_id: name.to_string(),
            item_url: format!("https://distrowatch.com/{name}"),
            value,
            trend,
        }
    }

    #[test]
    fn pivot_and_two_followers() {
        let rows = vec![
            row("mx", 2417, Trend::Up),
            row("mint", 1996, Trend::Down),
            row("endeavour", 1475, Trend::Flat),
            row("debian", 839, Trend::Down),
            row("manjaro", 828, Trend::Up),
            row("ubuntu", 700, Trend::Up),
        ];
        let outcome = extract(&rows).unwrap();
        assert_eq!(outcome.pivot_item_id, "endeavour");
        assert_eq!(outcome.pivot_item_url, "https://distrowatch.com/endeavour");
        assert_eq!(outcome.pivot_value, 1475);
        assert_eq!(outcome.next1_value, 839);
        assert_eq!(outcome.next1_trend, Trend::Down);
        assert_eq!(outcome.next2_value, 828);
        assert_eq!(outcome.next2_trend, Trend::Up);
    }

    #[test]
    fn pivot_found_at_every_index_with_room() {
        for k in 0..8 {
            let mut rows: Vec<Row> = (0..k)
                .map(|i| row(&format!("pre{i}"), 5000 - i as u32, if i % 2 == 0 { Trend::Up } else { Trend::Down }))
                .collect();
            rows.push(row("pivot", 100, Trend::Flat));
            rows.push(row("a", 90, Trend::Up));
            rows.push(row("b", 80, Trend::Down));

            let outcome = extract(&rows).unwrap();
            assert_eq!(outcome.pivot_item_id, "pivot", "k={k}");
            assert_eq!(outcome.next1_value, 90);
            assert_eq!(outcome.next2_value, 80);
        }
    }

    #[test]
    fn first_flat_row_wins_and_followers_may_be_flat() {
        let rows = vec![
            row("first", 10, Trend::Flat),
            row("second", 9, Trend::Flat),
            row("third", 8, Trend::Flat),
        ];
        let outcome = extract(&rows).unwrap();
        assert_eq!(outcome.pivot_item_id, "first");
        assert_eq!(outcome.next1_trend, Trend::Flat);
        assert_eq!(outcome.next2_trend, Trend::Flat);
    }

    #[test]
    fn no_flat_row_is_not_found() {
        let rows = vec![row("a", 3, Trend::Up), row("b", 2, Trend::Down), row("c", 1, Trend::Up)];
        assert_eq!(extract(&rows), Err(ExtractionError::NotFound));
        assert_eq!(extract(&[]), Err(ExtractionError::NotFound));
    }

    #[test]
    fn pivot_in_last_two_positions_is_truncated() {
        let last = vec![row("a", 3, Trend::Up), row("b", 2, Trend::Down), row("c", 1, Trend::Flat)];
        assert_eq!(extract(&last), Err(ExtractionError::Truncated));

        let second_to_last = vec![row("a", 3, Trend::Up), row("b", 2, Trend::Flat), row("c", 1, Trend::Up)];
        assert_eq!(extract(&second_to_last), Err(ExtractionError::Truncated));
    }
}
