use anyhow::Context;
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use std::fs::File;
use std::io::Read;

pub type UserId = u64;
pub type ItemId = u64;
pub type Rating = f32;

pub const DEFAULT_USER_COL: &str = "userID";
pub const DEFAULT_ITEM_COL: &str = "itemID";
const RATING_COL: &str = "rating";

/// Reads (user, item, rating) interactions from a csv file with a header row.
///
/// The user and item columns are resolved by header name so that datasets
/// with arbitrary column layouts can be consumed. A `rating` column is
/// honored when present, otherwise every interaction gets rating 1.0.
pub fn read_interactions(
    path: &str,
    user_col: &str,
    item_col: &str,
) -> anyhow::Result<Vec<(UserId, ItemId, Rating)>> {
    let file =
        File::open(path).with_context(|| format!("could not open interaction file {}", path))?;
    read_interactions_from(file, user_col, item_col)
        .with_context(|| format!("could not parse interaction file {}", path))
}

pub fn read_interactions_from<R: Read>(
    reader: R,
    user_col: &str,
    item_col: &str,
) -> anyhow::Result<Vec<(UserId, ItemId, Rating)>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let user_position = headers
        .iter()
        .position(|header| header == user_col)
        .with_context(|| format!("column '{}' not found in header", user_col))?;
    let item_position = headers
        .iter()
        .position(|header| header == item_col)
        .with_context(|| format!("column '{}' not found in header", item_col))?;
    let rating_position = headers.iter().position(|header| header == RATING_COL);

    let mut interactions = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let user = record
            .get(user_position)
            .with_context(|| format!("record {:?} has no user field", record))?
            .trim()
            .parse::<UserId>()?;
        let item = record
            .get(item_position)
            .with_context(|| format!("record {:?} has no item field", record))?
            .trim()
            .parse::<ItemId>()?;
        let rating = match rating_position.and_then(|position| record.get(position)) {
            Some(raw) => raw.trim().parse::<Rating>()?,
            None => 1.0,
        };
        interactions.push((user, item, rating));
    }
    Ok(interactions)
}

/// Items every user interacted with, as lookup sets for seen-item exclusion.
pub fn seen_items_by_user(
    interactions: &[(UserId, ItemId, Rating)],
) -> HashMap<UserId, HashSet<ItemId>> {
    let mut seen: HashMap<UserId, HashSet<ItemId>> = HashMap::new();
    for (user, item, _rating) in interactions {
        seen.entry(*user).or_default().insert(*item);
    }
    seen
}

/// Held-out items per user, in file order.
pub fn relevant_items_by_user(
    interactions: &[(UserId, ItemId, Rating)],
) -> HashMap<UserId, Vec<ItemId>> {
    interactions
        .iter()
        .map(|(user, item, _rating)| (*user, *item))
        .into_group_map()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod io_test {
    use super::*;

    #[test]
    fn should_read_interactions_with_default_columns() {
        let data = "userID,itemID,rating,timestamp\n1,10,4.0,881250949\n1,11,3.0,881250950\n2,10,5.0,881250951\n";
        let interactions =
            read_interactions_from(data.as_bytes(), DEFAULT_USER_COL, DEFAULT_ITEM_COL).unwrap();
        assert_eq!(
            vec![(1, 10, 4.0), (1, 11, 3.0), (2, 10, 5.0)],
            interactions
        );
    }

    #[test]
    fn should_resolve_overridden_columns_and_default_rating() {
        let data = "visitor,sku\n7,100\n7,200\n";
        let interactions = read_interactions_from(data.as_bytes(), "visitor", "sku").unwrap();
        assert_eq!(vec![(7, 100, 1.0), (7, 200, 1.0)], interactions);
    }

    #[test]
    fn should_fail_on_missing_column() {
        let data = "userID,itemID\n1,10\n";
        let result = read_interactions_from(data.as_bytes(), "visitor", "itemID");
        assert!(result.is_err());
    }

    #[test]
    fn should_fail_on_malformed_record() {
        let data = "userID,itemID\n1,not-an-item\n";
        let result = read_interactions_from(data.as_bytes(), DEFAULT_USER_COL, DEFAULT_ITEM_COL);
        assert!(result.is_err());
    }

    #[test]
    fn should_group_interactions_per_user() {
        let interactions = vec![(1, 10, 1.0), (1, 11, 1.0), (2, 10, 1.0)];
        let seen = seen_items_by_user(&interactions);
        assert!(seen[&1].contains(&10));
        assert!(seen[&1].contains(&11));
        assert!(!seen[&2].contains(&11));

        let relevant = relevant_items_by_user(&interactions);
        assert_eq!(vec![10, 11], relevant[&1]);
        assert_eq!(vec![10], relevant[&2]);
    }
}
