//! Behavioural tests for [`build_query`].

use groomer_core::{CityCell, OverpassQuery, build_query};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

#[fixture]
fn cell() -> RefCell<Option<CityCell>> {
    RefCell::new(None)
}

#[fixture]
fn query() -> RefCell<Option<OverpassQuery>> {
    RefCell::new(None)
}

fn built(query: &RefCell<Option<OverpassQuery>>) -> String {
    query
        .borrow()
        .as_ref()
        .expect("query was built")
        .to_string()
}

#[given("the Miami cell")]
fn given_miami(#[from(cell)] cell: &RefCell<Option<CityCell>>) {
    *cell.borrow_mut() = Some(CityCell::new("Miami", 25.7617, -80.1918, 45).expect("valid cell"));
}

#[when("a query is built at {radius} km")]
fn when_built(
    radius: u32,
    #[from(cell)] cell: &RefCell<Option<CityCell>>,
    #[from(query)] query: &RefCell<Option<OverpassQuery>>,
) {
    let guard = cell.borrow();
    let cell = guard.as_ref().expect("cell must be initialised");
    *query.borrow_mut() = Some(build_query(cell, radius));
}

#[then("the query searches {meters} metres around the cell centre")]
fn then_searches(meters: u64, #[from(query)] query: &RefCell<Option<OverpassQuery>>) {
    let text = built(query);
    let around = format!("(around:{meters},25.7617,-80.1918);");
    assert!(text.contains(&around), "missing {around} in {text}");
}

#[then("the query has {count} clauses")]
fn then_clause_count(count: usize, #[from(query)] query: &RefCell<Option<OverpassQuery>>) {
    let text = built(query);
    assert_eq!(text.matches("(around:").count(), count);
    assert!(text.starts_with("[out:json][timeout:120];"));
}

#[then("the query requests centres and tags")]
fn then_footer(#[from(query)] query: &RefCell<Option<OverpassQuery>>) {
    assert!(built(query).ends_with("out center tags;\n"));
}

#[scenario(path = "tests/features/query_builder.feature", index = 0)]
fn initial_radius(cell: RefCell<Option<CityCell>>, query: RefCell<Option<OverpassQuery>>) {
    let _ = (cell, query);
}

#[scenario(path = "tests/features/query_builder.feature", index = 1)]
fn shrunk_radius(cell: RefCell<Option<CityCell>>, query: RefCell<Option<OverpassQuery>>) {
    let _ = (cell, query);
}
