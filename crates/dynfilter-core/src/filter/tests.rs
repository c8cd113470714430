use crate::{
    cache::CacheManager,
    context::{ContextError, ContextResolver, ResolutionContext, StaticPanel},
    error::InternalError,
    filter::{DynamicFilter, FilterShape, FilterSpec, FilterSpecError, SourceOverride},
    format::{FormatOutput, OptionFormatter, OptionKey, ValueLabelMap},
    obs::{metrics_report, metrics_reset},
    query::{
        OptionsSource, Predicate, Queryable, RecordSet,
        memory::{MemoryQuery, MemoryTable},
    },
    value::{Date, Record, Value},
};
use std::sync::Arc;

fn customers() -> Arc<MemoryTable> {
    Arc::new(MemoryTable::new(
        "customers",
        vec![
            Record::new().with("id", 1).with("name", "Ada"),
            Record::new().with("id", 2).with("name", "Lin"),
            Record::new().with("id", 3).with("name", "Bo"),
        ],
    ))
}

fn orders() -> Arc<MemoryTable> {
    Arc::new(
        MemoryTable::new(
            "orders",
            vec![
                Record::new().with("id", 10).with("status", "paid").with("customer_id", 1),
                Record::new().with("id", 11).with("status", "open").with("customer_id", 2),
                Record::new().with("id", 12).with("status", "Paid").with("customer_id", 2),
                Record::new().with("id", 13).with("status", "void").with("customer_id", 1),
            ],
        )
        .with_relation("customer", customers(), "customer_id", "id"),
    )
}

fn single(name: &str) -> FilterSpec<MemoryQuery> {
    DynamicFilter::single(name).build().expect("valid filter")
}

struct FailingLookup;

impl ContextResolver for FailingLookup {
    fn current_panel(&self) -> Result<Option<String>, ContextError> {
        Err(ContextError("no active panel".into()))
    }
}

// ---------------------------------------------------------------------
// Declaration
// ---------------------------------------------------------------------

#[test]
fn defaults_derive_from_name() {
    let spec = single("customer_status");

    assert_eq!(spec.label(), "Customer Status");
    assert_eq!(spec.placeholder(), "Select an option");
    assert_eq!(spec.display_path(), "customer_status");
    assert_eq!(spec.predicate_column(), "customer_status");
    assert_eq!(spec.column_key(), "customer_status:customer_status");

    let multi = DynamicFilter::<MemoryQuery>::multiple("tags")
        .build()
        .expect("valid filter");
    assert_eq!(multi.placeholder(), "Select options");
}

#[test]
fn display_path_and_query_column_are_decoupled() {
    let spec = DynamicFilter::<MemoryQuery>::single("customer")
        .display_path("customer.name")
        .query_column("customer_id")
        .build()
        .expect("valid filter");

    assert_eq!(spec.extract_column(), "customer.name");
    assert_eq!(spec.predicate_column(), "customer_id");
    assert_eq!(spec.column_key(), "customer:customer_id");
}

#[test]
fn invalid_declarations_are_rejected() {
    assert_eq!(
        DynamicFilter::<MemoryQuery>::single("  ").build().err(),
        Some(FilterSpecError::EmptyName)
    );
    assert_eq!(
        DynamicFilter::<MemoryQuery>::single("status")
            .lazy(true)
            .build()
            .err(),
        Some(FilterSpecError::LazyRequiresSearchable("status".into()))
    );
    assert_eq!(
        DynamicFilter::<MemoryQuery>::relationship("customer", "", "name")
            .build()
            .err(),
        Some(FilterSpecError::EmptyRelationship("customer".into()))
    );
}

// ---------------------------------------------------------------------
// Query mutation
// ---------------------------------------------------------------------

#[test]
fn single_input_builds_equality_or_date_predicates() {
    let spec = single("status");
    let date = Date::parse("2024-01-01").expect("date");

    assert_eq!(
        spec.predicate_for(&Value::from("paid")),
        Some(Predicate::eq("status", "paid"))
    );
    assert_eq!(
        spec.predicate_for(&Value::from("2024-01-01")),
        Some(Predicate::date_eq("status", date))
    );
    assert_eq!(spec.predicate_for(&Value::from("")), None);
    assert_eq!(spec.predicate_for(&Value::Null), None);
    assert_eq!(
        spec.predicate_for(&Value::Bool(false)),
        Some(Predicate::eq("status", false))
    );
}

#[test]
fn multiple_dates_or_together() {
    let spec = DynamicFilter::<MemoryQuery>::multiple("created_at")
        .build()
        .expect("valid filter");
    let input = Value::from(vec!["2024-01-01", "2024-02-01"]);

    assert_eq!(
        spec.predicate_for(&input),
        Some(Predicate::Or(vec![
            Predicate::date_eq("created_at", Date::parse("2024-01-01").expect("date")),
            Predicate::date_eq("created_at", Date::parse("2024-02-01").expect("date")),
        ]))
    );
}

#[test]
fn multiple_scalars_use_one_in_predicate() {
    let spec = DynamicFilter::<MemoryQuery>::multiple("color")
        .build()
        .expect("valid filter");
    let input = Value::from(vec!["red", "", "blue"]);

    assert_eq!(
        spec.predicate_for(&input),
        Some(Predicate::in_list(
            "color",
            vec![Value::from("red"), Value::from("blue")]
        ))
    );
    assert_eq!(spec.predicate_for(&Value::from(Vec::<Value>::new())), None);
}

#[test]
fn relationship_predicates_wrap_in_exists() {
    let spec = DynamicFilter::<MemoryQuery>::relationship("customer", "customer", "name")
        .multiple_values(true)
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();

    let query = spec
        .contract(&cx, &cache)
        .apply(MemoryQuery::new(orders()), &Value::from(vec!["Lin"]));

    assert_eq!(
        query.predicates(),
        &[Predicate::exists(
            "customer",
            Predicate::in_list("name", vec![Value::from("Lin")])
        )]
    );
    assert_eq!(query.execute().expect("execute").len(), 2);
}

// ---------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------

#[test]
fn options_are_distinct_sorted_and_capped() {
    let spec = single("status");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();

    let options = spec.contract(&cx, &cache).options(&MemoryQuery::new(orders()));

    let keys: Vec<String> = options.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["Paid", "open", "paid", "void"]);
}

#[test]
fn options_follow_the_already_filtered_base_query() {
    let spec = single("status");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();
    let base = MemoryQuery::new(orders()).where_equals("customer_id", 1);

    let options = spec.contract(&cx, &cache).options(&base);

    let keys: Vec<String> = options.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["paid", "void"]);
}

#[test]
fn relationship_options_come_from_the_related_entity() {
    let spec = DynamicFilter::<MemoryQuery>::relationship("customer", "customer", "name")
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();
    let base = MemoryQuery::new(orders()).where_equals("customer_id", 1);

    let options = spec.contract(&cx, &cache).options(&base);

    let labels: Vec<&str> = options.iter().map(|(_, label)| label).collect();
    assert_eq!(labels, vec!["Ada", "Bo", "Lin"]);
}

#[test]
fn source_override_replaces_the_base_query() {
    let spec = DynamicFilter::<MemoryQuery>::single("status")
        .options_source(SourceOverride::new(|_| {
            Ok(OptionsSource::Records(RecordSet::from_iter(["b", "a", "b"])))
        }))
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();

    let options = spec.contract(&cx, &cache).options(&MemoryQuery::new(orders()));

    assert_eq!(options.len(), 2);
    assert_eq!(options.get(&OptionKey::from("a")), Some("a"));
}

#[test]
fn formatter_errors_degrade_to_empty_options() {
    metrics_reset();
    let spec = DynamicFilter::<MemoryQuery>::single("status")
        .format_option(OptionFormatter::new(|_| Err(InternalError::callback("boom"))))
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();

    let options = spec.contract(&cx, &cache).options(&MemoryQuery::new(orders()));

    assert!(options.is_empty());
    assert_eq!(metrics_report().resolution_failures, 1);
}

#[test]
fn key_collisions_keep_first_position_and_later_label() {
    metrics_reset();
    let spec = DynamicFilter::<MemoryQuery>::single("status")
        .format_option(OptionFormatter::from_fn(|value| {
            let text = value.text_projection();
            Some(FormatOutput::pair(text.to_lowercase(), text))
        }))
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();

    let options = spec.contract(&cx, &cache).options(&MemoryQuery::new(orders()));

    let entries: Vec<(String, &str)> = options.iter().map(|(k, l)| (k.to_string(), l)).collect();
    assert_eq!(
        entries,
        vec![
            ("paid".to_string(), "paid"),
            ("open".to_string(), "open"),
            ("void".to_string(), "void"),
        ]
    );
    assert_eq!(metrics_report().key_collisions, 1);
}

#[test]
fn lazy_filters_start_empty_and_search_on_demand() {
    let spec = DynamicFilter::<MemoryQuery>::single("status")
        .searchable(true)
        .lazy(true)
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();
    let table = orders();
    let base = MemoryQuery::new(Arc::clone(&table));
    let contract = spec.contract(&cx, &cache);

    assert!(contract.options(&base).is_empty());
    assert!(contract.search(&base, "   ").is_empty());
    assert_eq!(table.stats().executions(), 0);

    let found = contract.search(&base, "PA");
    let keys: Vec<String> = found.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["Paid", "paid"]);
}

#[test]
fn label_for_key_uses_map_without_querying() {
    let map: ValueLabelMap = [(1, "Active"), (0, "Inactive")].into_iter().collect();
    let spec = DynamicFilter::<MemoryQuery>::single("is_active")
        .searchable(true)
        .lazy(true)
        .options_map(map)
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();
    let contract = spec.contract(&cx, &cache);

    assert_eq!(contract.label_for_key(&Value::from("1")).as_deref(), Some("Active"));
    assert_eq!(contract.label_for_key(&Value::Int(0)).as_deref(), Some("Inactive"));
    assert_eq!(contract.label_for_key(&Value::from("")), None);
}

// ---------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------

#[test]
fn indicators_render_labels() {
    let map: ValueLabelMap = [("paid", "Paid in full")].into_iter().collect();
    let spec = DynamicFilter::<MemoryQuery>::single("status")
        .options_map(map.clone())
        .build()
        .expect("valid filter");
    let multi = DynamicFilter::<MemoryQuery>::multiple("status")
        .options_map(map)
        .build()
        .expect("valid filter");
    let dates = DynamicFilter::<MemoryQuery>::single("created_at")
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new();
    let cache = CacheManager::disabled();

    assert_eq!(
        spec.contract(&cx, &cache).indicator(&Value::from("paid")).as_deref(),
        Some("Status: Paid in full")
    );
    assert_eq!(
        multi
            .contract(&cx, &cache)
            .indicator(&Value::from(vec!["paid", "open"]))
            .as_deref(),
        Some("Status: Paid in full, open")
    );
    assert_eq!(
        dates
            .contract(&cx, &cache)
            .indicator(&Value::from("2024-03-05"))
            .as_deref(),
        Some("Created At: 2024-03-05")
    );
    assert_eq!(spec.contract(&cx, &cache).indicator(&Value::Null), None);
}

// ---------------------------------------------------------------------
// Access gate
// ---------------------------------------------------------------------

#[test]
fn access_panels_suppress_outside_their_panels() {
    metrics_reset();
    let spec = DynamicFilter::<MemoryQuery>::single("status")
        .access_panels(["admin"])
        .build()
        .expect("valid filter");
    let cx = ResolutionContext::new().with_context_resolver(Arc::new(StaticPanel::new("billing")));
    let cache = CacheManager::disabled();
    let table = orders();
    let base = MemoryQuery::new(Arc::clone(&table));

    let contract = spec.contract(&cx, &cache);

    assert!(contract.is_hidden());
    assert!(contract.options(&base).is_empty());
    assert!(contract.search(&base, "pa").is_empty());
    assert!(contract.apply(base.clone(), &Value::from("paid")).predicates().is_empty());
    assert_eq!(contract.indicator(&Value::from("paid")), None);
    assert_eq!(table.stats().executions(), 0);
    assert_eq!(metrics_report().access_suppressed, 1);
}

#[test]
fn access_gate_fails_open() {
    metrics_reset();
    let spec = DynamicFilter::<MemoryQuery>::single("status")
        .access_panels(["admin"])
        .build()
        .expect("valid filter");
    let cache = CacheManager::disabled();

    let no_panels = ResolutionContext::new();
    assert!(!spec.contract(&no_panels, &cache).is_hidden());

    let failing = ResolutionContext::new().with_context_resolver(Arc::new(FailingLookup));
    assert!(!spec.contract(&failing, &cache).is_hidden());
    assert_eq!(metrics_report().access_lookup_failures, 1);

    let admin = ResolutionContext::new().with_context_resolver(Arc::new(StaticPanel::new("admin")));
    assert!(!spec.contract(&admin, &cache).is_hidden());
}

#[test]
fn shapes_are_reported() {
    let spec = DynamicFilter::<MemoryQuery>::relationship("customer", "customer", "name")
        .build()
        .expect("valid filter");

    assert_eq!(
        spec.shape(),
        &FilterShape::Relationship {
            relation: "customer".into(),
            column: "name".into(),
        }
    );
}
