use std::collections::BTreeMap;

use common::Record;
use regex::{Regex, RegexBuilder};

use crate::CatalogError;

/// Field/substring terms; a record must match all of them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    terms: Vec<(String, String)>,
}

impl Query {
    pub fn field(field: &str, value: &str) -> Self {
        Self::default().and(field, value)
    }

    pub fn and(mut self, field: &str, value: &str) -> Self {
        self.terms.push((field.to_string(), value.to_string()));
        self
    }

    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

struct Matcher {
    field: String,
    pattern: Regex,
}

impl Matcher {
    fn is_match<T: Record>(&self, record: &T) -> bool {
        match record.field(&self.field) {
            Some(value) => self.pattern.is_match(&value),
            None => false,
        }
    }
}

fn compile(query: &Query) -> Result<Vec<Matcher>, CatalogError> {
    let mut out = Vec::with_capacity(query.terms.len());
    for (field, value) in &query.terms {
        let pattern = RegexBuilder::new(&format!("^.*{}", regex::escape(value)))
            .case_insensitive(true)
            .build()
            .map_err(|err| CatalogError::InvalidQuery(err.to_string()))?;
        out.push(Matcher {
            field: field.clone(),
            pattern,
        });
    }
    Ok(out)
}

/// Records whose fields contain every query value, ignoring case.
pub fn search<'a, T: Record>(
    entities: &'a BTreeMap<String, T>,
    query: &Query,
) -> Result<Vec<&'a T>, CatalogError> {
    if query.is_empty() {
        return Err(CatalogError::EmptyQuery);
    }
    if entities.is_empty() {
        return Err(CatalogError::EmptyCatalog);
    }
    let matchers = compile(query)?;
    Ok(entities
        .values()
        .filter(|record| matchers.iter().all(|m| m.is_match(*record)))
        .collect())
}

pub fn search_ids<T: Record>(
    entities: &BTreeMap<String, T>,
    query: &Query,
) -> Result<Vec<String>, CatalogError> {
    let found = search(entities, query)?;
    Ok(found.into_iter().map(|r| r.id().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Artist;
    use std::path::Path;

    fn artists(names: &[&str]) -> BTreeMap<String, Artist> {
        names
            .iter()
            .filter_map(|name| Artist::from_dir(&Path::new("/music").join(name)))
            .map(|artist| (artist.id.clone(), artist))
            .collect()
    }

    #[test]
    fn matches_ignoring_case() {
        let store = artists(&["ABBA"]);
        assert_eq!(search(&store, &Query::field("name", "abba")).unwrap().len(), 1);
        assert_eq!(search(&store, &Query::field("name", "bb")).unwrap().len(), 1);
        assert!(search(&store, &Query::field("name", "queen")).unwrap().is_empty());
    }

    #[test]
    fn values_match_literally() {
        let store = artists(&["AC.DC", "ACXDC"]);
        let found = search(&store, &Query::field("name", "c.d")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "AC.DC");
        assert!(search(&store, &Query::field("name", "(")).unwrap().is_empty());
    }

    #[test]
    fn every_term_must_match() {
        let store = artists(&["Abba", "Adele"]);
        let query = Query::field("name", "a").and("path", "adele");
        let ids = search_ids(&store, &query).unwrap();
        assert_eq!(ids, vec![common::entry_id(Path::new("/music/Adele"))]);
    }

    #[test]
    fn missing_fields_never_match() {
        let store = artists(&["Abba"]);
        assert!(search(&store, &Query::field("genre", "pop")).unwrap().is_empty());
    }

    #[test]
    fn empty_inputs_are_errors() {
        let store = artists(&["Abba"]);
        assert!(matches!(
            search(&store, &Query::default()),
            Err(CatalogError::EmptyQuery)
        ));
        let empty: BTreeMap<String, Artist> = BTreeMap::new();
        assert!(matches!(
            search(&empty, &Query::field("name", "a")),
            Err(CatalogError::EmptyCatalog)
        ));
    }
}
