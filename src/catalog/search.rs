use crate::catalog::Listing;

/// Case-insensitive substring match on name or description, plus an exact
/// case-insensitive category match when a category is given.
pub fn search<'a>(
    listings: &'a [Listing],
    query: &str,
    category: Option<&str>,
) -> Vec<&'a Listing> {
    let query = query.to_lowercase();
    let category = category.map(str::to_lowercase);

    listings
        .iter()
        .filter(|l| {
            let hit = |key| l.text(key).to_lowercase().contains(&query);
            hit("name") || hit("description")
        })
        .filter(|l| match &category {
            Some(c) => l.text("category").to_lowercase() == *c,
            None => true,
        })
        .collect()
}
