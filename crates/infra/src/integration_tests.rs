//! Service flows over the in-memory store.
//!
//! Verifies:
//! - the delete policy (forced event cascade, SKU deletes always blocked)
//! - owner isolation for reads, writes and references
//! - filters, summaries, rankings and simulations through the service

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use tally_analytics::{GroupBy, Metric, PricingRule, RuleMatch, SaleQueryParams};
use tally_core::{EventId, Money, OwnerId, SkuId};
use tally_ledger::{
    Event, EventPatch, ItemType, NewEvent, NewSaleLine, NewSku, SaleLinePatch, Sku, SkuPatch,
};

use crate::error::ServiceError;
use crate::service::{BundleLine, LedgerService};
use crate::store::{InMemoryLedgerStore, LedgerStore};

type Service = LedgerService<Arc<InMemoryLedgerStore>>;

fn setup() -> Service {
    LedgerService::new(Arc::new(InMemoryLedgerStore::new()))
}

fn owner(name: &str) -> OwnerId {
    OwnerId::new(name).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn money(cents: i64) -> Money {
    Money::from_cents(cents)
}

fn new_event(svc: &Service, owner: &OwnerId, name: &str) -> Event {
    svc.create_event(
        owner,
        NewEvent {
            name: name.to_string(),
            start_date: None,
            end_date: None,
        },
    )
    .unwrap()
}

fn new_sku(svc: &Service, owner: &OwnerId, name: &str, item_type: ItemType, cost: Money) -> Sku {
    svc.create_sku(
        owner,
        NewSku {
            name: name.to_string(),
            item_type,
            default_price: Money::ZERO,
            default_cost: cost,
        },
    )
    .unwrap()
}

fn sale(event: EventId, sku: SkuId, on: NaiveDate, units: i64, price: Money, cost: Money) -> NewSaleLine {
    NewSaleLine {
        event_id: event,
        sku_id: sku,
        sale_date: on,
        units,
        price_unit: price,
        cost_unit: cost,
        is_bundle: false,
        bundle_id: None,
        bundle_size: None,
        bundle_price: None,
        is_gift: false,
        notes: None,
    }
}

fn params() -> SaleQueryParams {
    SaleQueryParams::default()
}

/// The two-row ledger used across the analytics tests:
/// 2 prints at 20.00 (cost 5.00) and 1 sticker at 3.00 (cost 0.50).
struct Convention {
    svc: Service,
    maya: OwnerId,
    event: Event,
    print: Sku,
    sticker: Sku,
}

fn convention() -> Convention {
    let svc = setup();
    let maya = owner("maya");
    let event = new_event(&svc, &maya, "Anime North");
    let print = new_sku(&svc, &maya, "Gojo", ItemType::Print, money(500));
    let sticker = new_sku(&svc, &maya, "Holo sticker", ItemType::Sticker, money(50));
    let day = date(2025, 5, 24);
    svc.record_sale(&maya, sale(event.id, print.id, day, 2, money(2000), money(500)))
        .unwrap();
    svc.record_sale(&maya, sale(event.id, sticker.id, day, 1, money(300), money(50)))
        .unwrap();

    Convention {
        svc,
        maya,
        event,
        print,
        sticker,
    }
}

// ---- delete policy ----

#[test]
fn event_with_sales_needs_force_to_delete() {
    let c = convention();

    let err = c.svc.delete_event(&c.maya, c.event.id, false).unwrap_err();
    assert!(matches!(err, ServiceError::ConflictBlocked(_)));
    assert_eq!(err.status(), 409);
    assert_eq!(c.svc.list_sales(&c.maya, &params()).unwrap().len(), 2);

    let removed = c.svc.delete_event(&c.maya, c.event.id, true).unwrap();
    assert_eq!(removed, 2);
    assert!(c.svc.list_sales(&c.maya, &params()).unwrap().is_empty());
    assert!(matches!(
        c.svc.get_event(&c.maya, c.event.id),
        Err(ServiceError::NotFound { entity: "event", .. })
    ));
}

#[test]
fn unused_event_deletes_without_force() {
    let svc = setup();
    let maya = owner("maya");
    let event = new_event(&svc, &maya, "Empty table");

    assert_eq!(svc.delete_event(&maya, event.id, false).unwrap(), 0);
    assert!(svc.list_events(&maya).unwrap().is_empty());
}

#[test]
fn referenced_sku_is_never_deleted() {
    let c = convention();

    let err = c.svc.delete_sku(&c.maya, c.print.id).unwrap_err();
    assert!(matches!(err, ServiceError::ConflictBlocked(_)));

    // Removing the referencing sale is the only way.
    let print_sales = SaleQueryParams {
        sku: Some(c.print.id.to_string()),
        ..params()
    };
    for view in c.svc.list_sales(&c.maya, &print_sales).unwrap() {
        c.svc.delete_sale(&c.maya, view.id).unwrap();
    }
    c.svc.delete_sku(&c.maya, c.print.id).unwrap();
    assert_eq!(c.svc.list_skus(&c.maya).unwrap(), vec![c.sticker.clone()]);
}

#[test]
fn deleting_missing_rows_is_not_found() {
    let svc = setup();
    let maya = owner("maya");

    assert_eq!(svc.delete_event(&maya, EventId::new(), true).unwrap_err().status(), 404);
    assert_eq!(svc.delete_sku(&maya, SkuId::new()).unwrap_err().status(), 404);
}

// ---- writes ----

#[test]
fn duplicate_sku_is_unique_violation() {
    let svc = setup();
    let maya = owner("maya");
    new_sku(&svc, &maya, "Gojo", ItemType::Print, money(500));

    let err = svc
        .create_sku(
            &maya,
            NewSku {
                name: "Gojo".to_string(),
                item_type: ItemType::Print,
                default_price: Money::ZERO,
                default_cost: Money::ZERO,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::UniqueViolation(_)));
    assert_eq!(err.code(), "unique_violation");

    // Another type or another owner may reuse the name.
    new_sku(&svc, &maya, "Gojo", ItemType::Keychain, money(300));
    new_sku(&svc, &owner("ren"), "Gojo", ItemType::Print, money(500));
}

#[test]
fn renaming_sku_onto_existing_identity_is_rejected() {
    let svc = setup();
    let maya = owner("maya");
    new_sku(&svc, &maya, "Gojo", ItemType::Print, money(500));
    let other = new_sku(&svc, &maya, "Sukuna", ItemType::Print, money(500));

    let patch = SkuPatch {
        name: Some("Gojo".to_string()),
        ..SkuPatch::default()
    };
    assert!(matches!(
        svc.update_sku(&maya, other.id, &patch),
        Err(ServiceError::UniqueViolation(_))
    ));
}

#[test]
fn partial_bundle_fields_are_rejected_per_field() {
    let c = convention();
    let mut input = sale(c.event.id, c.print.id, date(2025, 5, 24), 1, money(2000), money(500));
    input.is_bundle = true;
    input.bundle_id = Some("B-1".to_string());

    match c.svc.record_sale(&c.maya, input).unwrap_err() {
        ServiceError::Validation(errors) => {
            let fields: Vec<&str> = errors.fields().iter().map(|f| f.field).collect();
            assert!(fields.contains(&"bundle_size"));
            assert!(fields.contains(&"bundle_price"));
        }
        other => panic!("Expected Validation, got {other:?}"),
    }
}

#[test]
fn oversized_amounts_are_validation_errors_not_panics() {
    let c = convention();
    let huge: Money = "79228162514264337593543950335".parse().unwrap();

    let input = sale(c.event.id, c.print.id, date(2025, 5, 25), 2, huge, money(100));
    match c.svc.record_sale(&c.maya, input).unwrap_err() {
        ServiceError::Validation(errors) => assert_eq!(errors.fields()[0].field, "price_unit"),
        other => panic!("Expected Validation, got {other:?}"),
    }

    let lines = vec![BundleLine {
        sku_id: c.print.id,
        units: 2,
        cost_unit: Some(huge),
    }];
    assert!(matches!(
        c.svc.quote_bundle(&c.maya, &lines, money(2700)),
        Err(ServiceError::Validation(_))
    ));

    // Nothing was stored, so reports over the owner still work.
    assert_eq!(c.svc.summary(&c.maya, &params(), GroupBy::Sku).unwrap().len(), 2);
}

#[test]
fn sale_views_carry_derived_figures() {
    let c = convention();
    let mut input = sale(c.event.id, c.print.id, date(2025, 5, 25), 3, Money::new(dec!(3.33)), money(100));
    input.notes = Some("  traded for a pin  ".to_string());

    let view = c.svc.record_sale(&c.maya, input).unwrap();
    assert_eq!(view.revenue, Money::new(dec!(9.99)));
    assert_eq!(view.cogs, money(300));
    assert_eq!(view.gross_margin_unit, Money::new(dec!(2.33)));
    assert_eq!(view.gross_profit, Money::new(dec!(6.99)));
    assert_eq!(view.notes, "traded for a pin");
    assert_eq!(view.sku.name, "Gojo");
    assert_eq!(view.event.name, "Anime North");

    assert_eq!(c.svc.get_sale(&c.maya, view.id).unwrap(), view);
}

#[test]
fn update_sale_revalidates_and_reresolves() {
    let c = convention();
    let view = c.svc.list_sales(&c.maya, &params()).unwrap().remove(0);

    let to_sticker = SaleLinePatch {
        sku_id: Some(c.sticker.id),
        units: Some(4),
        ..SaleLinePatch::default()
    };
    let updated = c.svc.update_sale(&c.maya, view.id, &to_sticker).unwrap();
    assert_eq!(updated.sku.id, c.sticker.id);
    assert_eq!(updated.units, 4);

    let zero_units = SaleLinePatch {
        units: Some(0),
        ..SaleLinePatch::default()
    };
    assert!(matches!(
        c.svc.update_sale(&c.maya, view.id, &zero_units),
        Err(ServiceError::Validation(_))
    ));

    let dangling = SaleLinePatch {
        event_id: Some(EventId::new()),
        ..SaleLinePatch::default()
    };
    assert!(matches!(
        c.svc.update_sale(&c.maya, view.id, &dangling),
        Err(ServiceError::NotFound { entity: "event", .. })
    ));
}

#[test]
fn event_patch_can_clear_dates() {
    let svc = setup();
    let maya = owner("maya");
    let event = svc
        .create_event(
            &maya,
            NewEvent {
                name: "Anime North".to_string(),
                start_date: Some(date(2025, 5, 23)),
                end_date: Some(date(2025, 5, 25)),
            },
        )
        .unwrap();

    let patch: EventPatch = serde_json::from_str(r#"{"end_date": null}"#).unwrap();
    let updated = svc.update_event(&maya, event.id, &patch).unwrap();
    assert_eq!(updated.start_date, Some(date(2025, 5, 23)));
    assert_eq!(updated.end_date, None);
    assert_eq!(svc.get_event(&maya, event.id).unwrap(), updated);
}

// ---- owner isolation ----

#[test]
fn owners_never_see_each_other() {
    let c = convention();
    let ren = owner("ren");

    assert!(c.svc.list_sales(&ren, &params()).unwrap().is_empty());
    assert!(c.svc.list_events(&ren).unwrap().is_empty());
    assert!(c.svc.summary(&ren, &params(), GroupBy::Sku).unwrap().is_empty());
    assert!(matches!(
        c.svc.get_sku(&ren, c.print.id),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        c.svc.delete_event(&ren, c.event.id, true),
        Err(ServiceError::NotFound { .. })
    ));
    assert_eq!(c.svc.list_events(&c.maya).unwrap().len(), 1);
}

#[test]
fn sale_cannot_reference_another_owners_sku() {
    let c = convention();
    let ren = owner("ren");
    let rens_event = new_event(&c.svc, &ren, "Otakuthon");

    let err = c
        .svc
        .record_sale(
            &ren,
            sale(rens_event.id, c.print.id, date(2025, 8, 1), 1, money(2000), money(500)),
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "sku", .. }));
}

// ---- filters ----

#[test]
fn february_filter_is_inclusive_of_the_whole_month() {
    let svc = setup();
    let maya = owner("maya");
    let event = new_event(&svc, &maya, "Winter market");
    let sku = new_sku(&svc, &maya, "Gojo", ItemType::Print, money(500));
    for day in [date(2025, 1, 31), date(2025, 2, 1), date(2025, 2, 28), date(2025, 3, 1)] {
        svc.record_sale(&maya, sale(event.id, sku.id, day, 1, money(2000), money(500)))
            .unwrap();
    }

    let feb = SaleQueryParams {
        year: Some("2025".to_string()),
        month: Some("2".to_string()),
        ..params()
    };
    let dates: Vec<NaiveDate> = svc
        .list_sales(&maya, &feb)
        .unwrap()
        .iter()
        .map(|v| v.sale_date)
        .collect();
    assert_eq!(dates, vec![date(2025, 2, 28), date(2025, 2, 1)]);
}

#[test]
fn item_type_filter_runs_after_the_store_pass() {
    let c = convention();
    let prints = SaleQueryParams {
        item_type: Some("print".to_string()),
        ..params()
    };

    let views = c.svc.list_sales(&c.maya, &prints).unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].sku.item_type, ItemType::Print);
}

#[test]
fn malformed_filters_degrade_to_empty() {
    let c = convention();

    for bad in [
        SaleQueryParams {
            event: Some("not-an-id".to_string()),
            ..params()
        },
        SaleQueryParams {
            year: Some("twenty".to_string()),
            ..params()
        },
        SaleQueryParams {
            item_type: Some("poster".to_string()),
            ..params()
        },
    ] {
        assert!(c.svc.list_sales(&c.maya, &bad).unwrap().is_empty());
        assert!(c.svc.summary(&c.maya, &bad, GroupBy::ItemType).unwrap().is_empty());
    }
}

#[test]
fn listing_is_newest_first() {
    let svc = setup();
    let maya = owner("maya");
    let event = new_event(&svc, &maya, "Anime North");
    let sku = new_sku(&svc, &maya, "Gojo", ItemType::Print, money(500));
    for day in [date(2025, 5, 23), date(2025, 5, 25), date(2025, 5, 24)] {
        svc.record_sale(&maya, sale(event.id, sku.id, day, 1, money(2000), money(500)))
            .unwrap();
    }

    let dates: Vec<u32> = svc
        .list_sales(&maya, &params())
        .unwrap()
        .iter()
        .map(|v| chrono::Datelike::day(&v.sale_date))
        .collect();
    assert_eq!(dates, vec![25, 24, 23]);
}

// ---- analytics ----

#[test]
fn summary_by_item_type() {
    let c = convention();

    let groups = c.svc.summary(&c.maya, &params(), GroupBy::ItemType).unwrap();
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0].key, "print");
    assert_eq!(groups[0].figures.units, 2);
    assert_eq!(groups[0].figures.revenue, money(4000));
    assert_eq!(groups[0].figures.cogs, money(1000));
    assert_eq!(groups[0].figures.gross_profit, money(3000));

    assert_eq!(groups[1].key, "sticker");
    assert_eq!(groups[1].figures.revenue, money(300));
    assert_eq!(groups[1].figures.cogs, money(50));
    assert_eq!(groups[1].figures.gross_profit, money(250));

    let json = serde_json::to_value(&groups).unwrap();
    assert_eq!(json[0]["revenue"], "40.00");
    assert_eq!(json[1]["gross_profit"], "2.50");
}

#[test]
fn top_and_bottom_by_gross_profit() {
    let c = convention();

    let report = c
        .svc
        .top_bottom(&c.maya, &params(), Metric::GrossProfit, 1)
        .unwrap();
    assert_eq!(report.top.len(), 1);
    assert_eq!(report.top[0].sku_id, c.print.id);
    assert_eq!(report.bottom.len(), 1);
    assert_eq!(report.bottom[0].sku_id, c.sticker.id);

    let err = c
        .svc
        .top_bottom(&c.maya, &params(), Metric::GrossProfit, 0)
        .unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn hypothetical_reprices_prints_only() {
    let c = convention();
    let rules = vec![PricingRule::new(
        RuleMatch {
            item_type: Some(ItemType::Print),
            ..RuleMatch::default()
        },
        money(800),
    )];

    let report = c.svc.hypothetical(&c.maya, &params(), &rules).unwrap();
    let print = report.by_sku.iter().find(|b| b.sku_id == c.print.id).unwrap();
    assert_eq!(print.figures.revenue, money(1600));
    assert_eq!(print.figures.cogs, money(1000));
    assert_eq!(print.figures.gross_profit, money(600));

    let sticker = report.by_sku.iter().find(|b| b.sku_id == c.sticker.id).unwrap();
    assert_eq!(sticker.figures.revenue, money(300));

    // Stored data is untouched.
    let stored = c.svc.summary(&c.maya, &params(), GroupBy::Sku).unwrap();
    let revenue: Money = stored.iter().map(|g| g.figures.revenue).sum();
    assert_eq!(revenue, money(4300));
}

#[test]
fn later_rule_wins_through_the_service() {
    let c = convention();
    let rules = vec![
        PricingRule::new(
            RuleMatch {
                skus: Some(HashSet::from([c.print.id])),
                ..RuleMatch::default()
            },
            money(900),
        ),
        PricingRule::new(RuleMatch::default(), money(100)),
    ];

    let report = c.svc.hypothetical(&c.maya, &params(), &rules).unwrap();
    assert_eq!(report.total.revenue, money(300));
}

#[test]
fn sub_cent_rule_price_is_rejected() {
    let c = convention();
    let rules = vec![PricingRule::new(RuleMatch::default(), Money::new(dec!(1.005)))];
    assert!(matches!(
        c.svc.hypothetical(&c.maya, &params(), &rules),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn average_cost_skips_uncosted_skus() {
    let c = convention();
    new_sku(&c.svc, &c.maya, "Blank print", ItemType::Print, Money::ZERO);
    new_sku(&c.svc, &c.maya, "Sukuna", ItemType::Print, money(700));

    let averages = c.svc.average_cost_by_type(&c.maya).unwrap();
    let print = averages.iter().find(|a| a.item_type == ItemType::Print).unwrap();
    assert_eq!(print.average_cost, money(600));
    assert_eq!(print.costed_skus, 2);
}

#[test]
fn bundle_quote_falls_back_to_sku_cost() {
    let c = convention();
    let lines = vec![
        BundleLine {
            sku_id: c.print.id,
            units: 2,
            cost_unit: None,
        },
        BundleLine {
            sku_id: c.sticker.id,
            units: 1,
            cost_unit: Some(money(40)),
        },
    ];

    let quote = c.svc.quote_bundle(&c.maya, &lines, money(2700)).unwrap();
    assert_eq!(quote.total_cost, money(1040));
    assert_eq!(quote.total_units, 3);
    assert_eq!(quote.profit, money(1660));
    assert_eq!(quote.profit_per_unit, Money::new(dec!(5.53)));

    let foreign = vec![BundleLine {
        sku_id: c.print.id,
        units: 1,
        cost_unit: None,
    }];
    assert!(matches!(
        c.svc.quote_bundle(&owner("ren"), &foreign, money(100)),
        Err(ServiceError::NotFound { entity: "sku", .. })
    ));
}

#[test]
fn service_works_over_a_shared_store_handle() {
    let store = Arc::new(InMemoryLedgerStore::new());
    let writer = LedgerService::new(store.clone());
    let reader = LedgerService::new(store.clone());
    let maya = owner("maya");

    let event = new_event(&writer, &maya, "Anime North");
    assert_eq!(reader.get_event(&maya, event.id).unwrap(), event);
    assert_eq!(store.count_sale_lines_for_event(&maya, event.id).unwrap(), 0);
}
