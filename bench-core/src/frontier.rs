use std::collections::HashSet;

use crate::ModelRecord;

/// Models that set a new best `avg_success_rate` at their release date, in date order.
///
/// Records are scanned after a stable sort on `release_date`, so models released on
/// the same day are considered in file order: the first of them to reach a new best
/// joins the frontier, a later one needs a strictly higher score. Ties never
/// advance the frontier.
#[derive(Debug, Clone)]
pub struct Frontier<'a> {
    members: Vec<&'a ModelRecord>,
    ids: HashSet<&'a str>,
}

impl<'a> Frontier<'a> {
    pub fn compute(models: &'a [ModelRecord]) -> Self {
        let mut by_date: Vec<&ModelRecord> = models.iter().collect();
        by_date.sort_by_key(|m| m.release_date);

        let mut best = f64::NEG_INFINITY;
        let members: Vec<&ModelRecord> = by_date
            .into_iter()
            .filter(|m| {
                if m.avg_success_rate > best {
                    best = m.avg_success_rate;
                    true
                } else {
                    false
                }
            })
            .collect();
        let ids = members.iter().map(|m| m.id.as_str()).collect();
        Self { members, ids }
    }

    pub fn members(&self) -> &[&'a ModelRecord] {
        &self.members
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Split `models` into (non-frontier, frontier), each keeping file order.
    /// Non-frontier markers are drawn first so frontier markers stay on top.
    pub fn partition<'m>(
        &self,
        models: &'m [ModelRecord],
    ) -> (Vec<&'m ModelRecord>, Vec<&'m ModelRecord>) {
        let (sota, rest): (Vec<_>, Vec<_>) =
            models.iter().partition(|m| self.contains(&m.id));
        (rest, sota)
    }
}
