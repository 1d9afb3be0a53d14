use crate::model::{Assumption, FilteredAssumptions, NondetSiteMap};

/// Assumptions located at a known non-deterministic site, in input order.
pub fn retained<'a>(
    sites: &'a NondetSiteMap,
    assumptions: &'a [Assumption],
) -> impl Iterator<Item = &'a Assumption> + 'a {
    assumptions
        .iter()
        .filter(move |assumption| sites.contains(&assumption.position))
}

/// Keeps assumptions whose position is a known site and projects them to
/// their values. Input order is preserved; the harness consumes values in
/// exactly this order.
pub fn align(sites: &NondetSiteMap, assumptions: &[Assumption]) -> FilteredAssumptions {
    FilteredAssumptions::new(
        retained(sites, assumptions)
            .map(|assumption| assumption.value.clone())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    fn a(line: u32, value: &str) -> Assumption {
        Assumption::new(Position::new("Main", line), Some(value.to_string()))
    }

    fn map(lines: &[u32]) -> NondetSiteMap {
        lines
            .iter()
            .map(|&l| (Position::new("Main", l), "int".to_string()))
            .collect()
    }

    #[test]
    fn keeps_assumption_at_known_site() {
        assert_eq!(
            align(&map(&[5]), &[a(5, "1")]).values(),
            &[Some("1".to_string())]
        );
        assert_eq!(
            align(&map(&[5, 9]), &[a(5, "1")]).values(),
            &[Some("1".to_string())]
        );
    }

    #[test]
    fn drops_assumption_at_unknown_site() {
        assert!(align(&map(&[9]), &[a(5, "1")]).is_empty());
        assert!(align(&NondetSiteMap::new(), &[a(5, "1"), a(9, "2")]).is_empty());
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let assumptions = [a(9, "2"), a(5, "1"), a(7, "x"), a(9, "3")];
        let values = align(&map(&[5, 9]), &assumptions);
        assert_eq!(
            values.values(),
            &[
                Some("2".to_string()),
                Some("1".to_string()),
                Some("3".to_string())
            ]
        );
    }

    #[test]
    fn null_values_are_kept() {
        let assumptions = [Assumption::new(Position::new("Main", 5), None)];
        assert_eq!(align(&map(&[5]), &assumptions).values(), &[None]);
    }

    #[test]
    fn file_is_part_of_the_key() {
        let assumptions = [Assumption::new(Position::new("Util", 5), Some("1".into()))];
        assert!(align(&map(&[5]), &assumptions).is_empty());
    }
}
