//! End-to-end search tests against a migrated in-memory catalog.

use samla_core::model::{ElementKind, NewLocation, NewSet, SetId};
use samla_core::Database;
use samla_search::{search, SortKey};

fn names(results: &[samla_search::SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.set_name.as_str()).collect()
}

fn castle_catalog() -> (Database, SetId) {
    let db = Database::open_in_memory().unwrap();
    let loc = db.create_location(&NewLocation::new("L1")).unwrap();
    let bx = db.create_box(loc, "B1", "").unwrap();
    let set = db
        .create_bag_with_set(&NewSet::new(bx, "0001", "Castle Set"))
        .unwrap();
    (db, set)
}

/// Three sets spread over two locations and three boxes.
fn mixed_catalog() -> Database {
    let db = Database::open_in_memory().unwrap();
    let attic = db
        .create_location(&NewLocation::new("Attic").with_room("Upstairs"))
        .unwrap();
    let cellar = db.create_location(&NewLocation::new("Cellar")).unwrap();
    let a = db.create_box(attic, "A1", "Stamps").unwrap();
    let c = db.create_box(cellar, "C1", "Dies").unwrap();
    let z = db.create_box(attic, "Z9", "").unwrap();

    let zebra = db
        .create_bag_with_set(&NewSet::new(c, "0001", "Zebra Stamps").with_manufacturer("Acme"))
        .unwrap();
    let apple = db
        .create_bag_with_set(&NewSet::new(z, "0001", "Apple Dies"))
        .unwrap();
    let meadow = db
        .create_bag_with_set(&NewSet::new(a, "0002", "Meadow").with_manufacturer("Bloom Co"))
        .unwrap();

    db.set_tags(zebra, &["animals", "stripes"]).unwrap();
    db.set_tags(apple, &["fruit"]).unwrap();
    db.add_element(meadow, "Tulip outline", Some(ElementKind::Stanze))
        .unwrap();
    db
}

#[test]
fn test_castle_scenario() {
    let (db, set) = castle_catalog();

    let found = search(&db, "cas", SortKey::Name).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].set_id, set);
    assert_eq!(found[0].box_code, "B1");
    assert_eq!(found[0].bag_serial, "0001");
    assert_eq!(found[0].location_name, "L1");
    assert_eq!(found[0].manufacturer_name, "");

    let by_box = search(&db, "@box b1", SortKey::Name).unwrap();
    assert_eq!(names(&by_box), vec!["Castle Set"]);

    assert!(search(&db, "nomatch", SortKey::Name).unwrap().is_empty());
}

#[test]
fn test_empty_query_lists_everything() {
    let db = mixed_catalog();
    let all = search(&db, "   ", SortKey::Name).unwrap();
    assert_eq!(names(&all), vec!["Apple Dies", "Meadow", "Zebra Stamps"]);
}

#[test]
fn test_sort_orders() {
    let db = mixed_catalog();

    let by_box = search(&db, "", SortKey::Box).unwrap();
    assert_eq!(names(&by_box), vec!["Meadow", "Zebra Stamps", "Apple Dies"]);

    let by_location = search(&db, "", SortKey::Location).unwrap();
    assert_eq!(
        names(&by_location),
        vec!["Meadow", "Apple Dies", "Zebra Stamps"]
    );

    let by_added = search(&db, "", SortKey::Added).unwrap();
    assert_eq!(names(&by_added), vec!["Meadow", "Apple Dies", "Zebra Stamps"]);
}

#[test]
fn test_tag_filter_and_tags_in_results() {
    let db = mixed_catalog();
    let found = search(&db, "@tag STRIPES", SortKey::Name).unwrap();
    assert_eq!(names(&found), vec!["Zebra Stamps"]);
    assert_eq!(found[0].tags, vec!["animals", "stripes"]);
}

#[test]
fn test_manufacturer_and_location_filters() {
    let db = mixed_catalog();
    let acme = search(&db, "@hersteller acme", SortKey::Name).unwrap();
    assert_eq!(names(&acme), vec!["Zebra Stamps"]);

    let upstairs = search(&db, "@ort upstairs", SortKey::Name).unwrap();
    assert_eq!(names(&upstairs), vec!["Apple Dies", "Meadow"]);
}

#[test]
fn test_product_filter_matches_elements() {
    let db = mixed_catalog();
    let found = search(&db, "@produkt tulip", SortKey::Name).unwrap();
    assert_eq!(names(&found), vec!["Meadow"]);
}

#[test]
fn test_free_text_drops_element_only_matches() {
    let db = mixed_catalog();
    // matched in SQL through the element name, then refined away
    assert!(search(&db, "tulip", SortKey::Name).unwrap().is_empty());
}

#[test]
fn test_free_text_matches_tags_and_box_names() {
    let db = mixed_catalog();
    let fruit = search(&db, "fruit", SortKey::Name).unwrap();
    assert_eq!(names(&fruit), vec!["Apple Dies"]);

    // "dies" is both a set name fragment and a box name
    let dies = search(&db, "dies", SortKey::Name).unwrap();
    assert_eq!(names(&dies), vec!["Apple Dies", "Zebra Stamps"]);
}

#[test]
fn test_like_metacharacters_are_literal() {
    let db = mixed_catalog();
    assert!(search(&db, "%", SortKey::Name).unwrap().is_empty());
    assert!(search(&db, "@box _1", SortKey::Name).unwrap().is_empty());
}

#[test]
fn test_injection_like_input_is_harmless() {
    let (db, _) = castle_catalog();
    let found = search(&db, "'; DROP TABLE sets; --", SortKey::Name).unwrap();
    assert!(found.is_empty());
    assert_eq!(db.stats().unwrap().sets, 1);
}

#[test]
fn test_unicode_case_folding() {
    let db = Database::open_in_memory().unwrap();
    let loc = db.create_location(&NewLocation::new("Küche")).unwrap();
    let bx = db.create_box(loc, "K1", "Übersicht").unwrap();
    db.create_bag_with_set(&NewSet::new(bx, "0001", "Äpfel Stempel"))
        .unwrap();

    let found = search(&db, "äpfel", SortKey::Name).unwrap();
    assert_eq!(names(&found), vec!["Äpfel Stempel"]);

    let by_box = search(&db, "@box übersicht", SortKey::Name).unwrap();
    assert_eq!(names(&by_box), vec!["Äpfel Stempel"]);

    let by_place = search(&db, "@ort KÜCHE", SortKey::Name).unwrap();
    assert_eq!(names(&by_place), vec!["Äpfel Stempel"]);
}

#[test]
fn test_results_are_capped() {
    let db = Database::open_in_memory().unwrap();
    let loc = db.create_location(&NewLocation::new("Attic")).unwrap();
    let bx = db.create_box(loc, "A1", "").unwrap();
    let total = samla_search::MAX_RESULTS as usize + 5;
    for i in 0..total {
        db.create_bag_with_set(&NewSet::new(bx, format!("{i:04}"), format!("Set {i:03}")))
            .unwrap();
    }
    let expected: Vec<String> = (0..200).map(|i| format!("Set {i:03}")).collect();

    let all = search(&db, "", SortKey::Name).unwrap();
    assert_eq!(all.len(), 200);
    assert_eq!(names(&all), expected);

    let free = search(&db, "set", SortKey::Name).unwrap();
    assert_eq!(free.len(), 200);
    assert_eq!(names(&free), expected);

    let newest = search(&db, "", SortKey::Added).unwrap();
    assert_eq!(newest.len(), 200);
    assert_eq!(newest[0].set_name, format!("Set {:03}", total - 1));
    assert_eq!(newest[199].set_name, format!("Set {:03}", total - 200));
}
