//! Behavioral contract tests, run against both storage adapters.
//!
//! Every test takes the store through the public repository API only, so
//! whatever passes here holds regardless of which backend a device ends up
//! on.

use placelog_core::storage::{FlatBackend, SqliteBackend, StorageBackend};
use placelog_core::{
    CategoryKind, NewDish, NewList, NewPlace, NewTag, NewVisit, PlacePatch, Store, StoreError,
};

fn open_stores() -> Vec<(&'static str, Store)> {
    let sqlite: Box<dyn StorageBackend> =
        Box::new(SqliteBackend::open_in_memory().expect("in-memory sqlite"));
    let flat: Box<dyn StorageBackend> = Box::new(FlatBackend::in_memory());

    [("sqlite", sqlite), ("flat", flat)]
        .into_iter()
        .map(|(label, backend)| {
            let mut store = Store::new(backend);
            store.initialize().expect("initialize");
            (label, store)
        })
        .collect()
}

#[test]
fn test_created_ids_are_unique_and_non_empty() {
    for (label, store) in open_stores() {
        let a = store.places().create(NewPlace::new("A", 0.0, 0.0)).unwrap();
        let b = store.places().create(NewPlace::new("B", 0.0, 0.0)).unwrap();
        let list = store.lists().create(NewList::new("L")).unwrap();

        assert!(!a.id.is_empty(), "{}", label);
        assert_ne!(a.id, b.id, "{}", label);
        assert_ne!(a.id, list.id, "{}", label);
    }
}

#[test]
fn test_place_round_trips_with_empty_tag_ids() {
    for (label, store) in open_stores() {
        let created = store
            .places()
            .create(
                NewPlace::new("Trattoria Da Mario", 45.4642, 9.19)
                    .with_address("Via Roma 1")
                    .with_notes("Ask for the daily special")
                    .with_manual_rating(4.5),
            )
            .unwrap();

        let fetched = store.places().get(&created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Trattoria Da Mario", "{}", label);
        assert_eq!(fetched.address.as_deref(), Some("Via Roma 1"), "{}", label);
        assert_eq!(fetched.latitude, 45.4642, "{}", label);
        assert_eq!(fetched.longitude, 9.19, "{}", label);
        assert_eq!(fetched.overall_rating_manual, Some(4.5), "{}", label);
        assert_eq!(fetched.created_at, created.created_at, "{}", label);
        assert!(fetched.tag_ids.is_empty(), "{}", label);
        assert_eq!(fetched.overall_rating, Some(4.5), "{}", label);
    }
}

#[test]
fn test_place_update_round_trips_and_bumps_updated_at() {
    for (label, store) in open_stores() {
        let place = store
            .places()
            .create(NewPlace::new("Old Name", 1.0, 2.0))
            .unwrap();

        let updated = store
            .places()
            .update(
                &place.id,
                PlacePatch {
                    name: Some("New Name".to_string()),
                    ..PlacePatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "New Name", "{}", label);
        assert_eq!(updated.latitude, 1.0, "{}", label);
        assert!(
            updated.updated_at > place.updated_at,
            "{}: {} !> {}",
            label,
            updated.updated_at,
            place.updated_at
        );
    }
}

#[test]
fn test_update_missing_place_is_not_found() {
    for (label, store) in open_stores() {
        let err = store
            .places()
            .update("nope", PlacePatch::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "{}", label);
    }
}

#[test]
fn test_place_delete_cascades_transitively() {
    for (label, store) in open_stores() {
        let place = store
            .places()
            .create(NewPlace::new("Doomed", 0.0, 0.0))
            .unwrap();
        let list = store.lists().create(NewList::new("Favorites")).unwrap();
        store.lists().add_place(&list.id, &place.id).unwrap();
        let visit = store.visits().create(NewVisit::new(&place.id)).unwrap();
        let dish = store
            .dishes()
            .create(NewDish::new(&visit.id, "Carbonara", 5))
            .unwrap();
        let tag = store.tags().create(NewTag::new("Pasta")).unwrap();
        store.places().attach_tag(&place.id, &tag.id).unwrap();

        store.places().delete(&place.id).unwrap();

        assert!(store.places().get(&place.id).unwrap().is_none(), "{}", label);
        assert!(store.lists().items(&list.id).unwrap().is_empty(), "{}", label);
        assert!(
            store.visits().for_place(&place.id).unwrap().is_empty(),
            "{}",
            label
        );
        assert!(store.dishes().get(&dish.id).unwrap().is_none(), "{}", label);
        // The tag itself survives; only the membership is gone.
        assert!(store.tags().get(&tag.id).unwrap().is_some(), "{}", label);
        // The list survives with no members.
        assert!(store.lists().get(&list.id).unwrap().is_some(), "{}", label);
    }
}

#[test]
fn test_list_membership_orders_are_appended_and_never_reused() {
    for (label, store) in open_stores() {
        let list = store.lists().create(NewList::new("Route")).unwrap();
        let p1 = store.places().create(NewPlace::new("P1", 0.0, 0.0)).unwrap();
        let p2 = store.places().create(NewPlace::new("P2", 0.0, 0.0)).unwrap();
        let p3 = store.places().create(NewPlace::new("P3", 0.0, 0.0)).unwrap();

        let i1 = store.lists().add_place(&list.id, &p1.id).unwrap();
        let i2 = store.lists().add_place(&list.id, &p2.id).unwrap();
        assert_eq!(i1.order, 0, "{}", label);
        assert_eq!(i2.order, 1, "{}", label);

        store.lists().remove_place(&list.id, &p1.id).unwrap();
        let i3 = store.lists().add_place(&list.id, &p3.id).unwrap();
        assert!(i3.order > i2.order, "{}: {} !> {}", label, i3.order, i2.order);

        let items = store.lists().items(&list.id).unwrap();
        let member_places: Vec<&str> =
            items.iter().map(|item| item.place_id.as_str()).collect();
        assert_eq!(member_places, vec![p2.id.as_str(), p3.id.as_str()], "{}", label);
    }
}

#[test]
fn test_list_reorder_renumbers_densely() {
    for (label, store) in open_stores() {
        let list = store.lists().create(NewList::new("Route")).unwrap();
        let p1 = store.places().create(NewPlace::new("P1", 0.0, 0.0)).unwrap();
        let p2 = store.places().create(NewPlace::new("P2", 0.0, 0.0)).unwrap();
        store.lists().add_place(&list.id, &p1.id).unwrap();
        store.lists().add_place(&list.id, &p2.id).unwrap();

        store
            .lists()
            .reorder(&list.id, &[p2.id.clone(), p1.id.clone()])
            .unwrap();

        let items = store.lists().items(&list.id).unwrap();
        assert_eq!(items[0].place_id, p2.id, "{}", label);
        assert_eq!(items[0].order, 0, "{}", label);
        assert_eq!(items[1].place_id, p1.id, "{}", label);
        assert_eq!(items[1].order, 1, "{}", label);

        // A partial or foreign ordering is rejected.
        let err = store
            .lists()
            .reorder(&list.id, &[p1.id.clone()])
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{}", label);
        let err = store
            .lists()
            .reorder(&list.id, &[p1.id.clone(), "stranger".to_string()])
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{}", label);
    }
}

#[test]
fn test_list_rating_is_mean_of_member_place_ratings() {
    for (label, store) in open_stores() {
        let list = store.lists().create(NewList::new("Rated")).unwrap();
        let good = store
            .places()
            .create(NewPlace::new("Good", 0.0, 0.0).with_manual_rating(4.0))
            .unwrap();
        let poor = store
            .places()
            .create(NewPlace::new("Poor", 0.0, 0.0).with_manual_rating(2.0))
            .unwrap();
        // A place with no effective rating is skipped, not averaged as zero.
        let unrated = store
            .places()
            .create(NewPlace::new("Unrated", 0.0, 0.0))
            .unwrap();

        store.lists().add_place(&list.id, &good.id).unwrap();
        store.lists().add_place(&list.id, &poor.id).unwrap();
        store.lists().add_place(&list.id, &unrated.id).unwrap();

        let fetched = store.lists().get(&list.id).unwrap().unwrap();
        assert_eq!(fetched.overall_rating, Some(3.0), "{}", label);
    }
}

#[test]
fn test_empty_list_has_no_rating() {
    for (label, store) in open_stores() {
        let list = store.lists().create(NewList::new("Empty")).unwrap();
        let fetched = store.lists().get(&list.id).unwrap().unwrap();
        assert_eq!(fetched.overall_rating, None, "{}", label);
    }
}

#[test]
fn test_tag_names_are_unique_case_insensitively() {
    for (label, store) in open_stores() {
        store.tags().create(NewTag::new("Spicy")).unwrap();
        let err = store.tags().create(NewTag::new("spicy")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)), "{}", label);

        // Renaming onto another tag's name is rejected too.
        let mild = store.tags().create(NewTag::new("Mild")).unwrap();
        let err = store
            .tags()
            .update(
                &mild.id,
                placelog_core::TagPatch {
                    name: Some("SPICY".to_string()),
                    ..placelog_core::TagPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)), "{}", label);
    }
}

#[test]
fn test_tag_attach_detach_round_trip() {
    for (label, store) in open_stores() {
        let place = store
            .places()
            .create(NewPlace::new("Tagged", 0.0, 0.0))
            .unwrap();
        let tag = store.tags().create(NewTag::new("Cozy")).unwrap();

        store.places().attach_tag(&place.id, &tag.id).unwrap();
        // Re-attaching is a no-op, not a duplicate membership.
        store.places().attach_tag(&place.id, &tag.id).unwrap();

        let fetched = store.places().get(&place.id).unwrap().unwrap();
        assert_eq!(fetched.tag_ids, vec![tag.id.clone()], "{}", label);

        store.places().detach_tag(&place.id, &tag.id).unwrap();
        store.places().detach_tag(&place.id, &tag.id).unwrap();
        let fetched = store.places().get(&place.id).unwrap().unwrap();
        assert!(fetched.tag_ids.is_empty(), "{}", label);
    }
}

#[test]
fn test_tag_delete_detaches_everywhere() {
    for (label, store) in open_stores() {
        let p1 = store.places().create(NewPlace::new("P1", 0.0, 0.0)).unwrap();
        let p2 = store.places().create(NewPlace::new("P2", 0.0, 0.0)).unwrap();
        let tag = store.tags().create(NewTag::new("Gone")).unwrap();
        store.places().attach_tag(&p1.id, &tag.id).unwrap();
        store.places().attach_tag(&p2.id, &tag.id).unwrap();

        store.tags().delete(&tag.id).unwrap();

        assert!(
            store.places().get(&p1.id).unwrap().unwrap().tag_ids.is_empty(),
            "{}",
            label
        );
        assert!(
            store.places().get(&p2.id).unwrap().unwrap().tag_ids.is_empty(),
            "{}",
            label
        );
    }
}

#[test]
fn test_dish_rating_is_validated() {
    for (label, store) in open_stores() {
        let place = store
            .places()
            .create(NewPlace::new("Diner", 0.0, 0.0))
            .unwrap();
        let visit = store.visits().create(NewVisit::new(&place.id)).unwrap();

        for bad in [0, 6, -1] {
            let err = store
                .dishes()
                .create(NewDish::new(&visit.id, "Bad", bad))
                .unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{}: {}", label, bad);
        }
        store
            .dishes()
            .create(NewDish::new(&visit.id, "Fine", 3))
            .unwrap();
    }
}

#[test]
fn test_visit_requires_existing_place() {
    for (label, store) in open_stores() {
        let err = store.visits().create(NewVisit::new("ghost")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "{}", label);
    }
}

#[test]
fn test_deletes_are_idempotent() {
    for (label, store) in open_stores() {
        let list = store.lists().create(NewList::new("Twice")).unwrap();
        store.lists().delete(&list.id).unwrap();
        store.lists().delete(&list.id).unwrap();

        let place = store.places().create(NewPlace::new("P", 0.0, 0.0)).unwrap();
        store.places().delete(&place.id).unwrap();
        store.places().delete(&place.id).unwrap();

        assert!(store.lists().get(&list.id).unwrap().is_none(), "{}", label);
        assert!(store.places().get(&place.id).unwrap().is_none(), "{}", label);
    }
}

#[test]
fn test_default_place_categories_are_seeded_once() {
    for (label, store) in open_stores() {
        let categories = store.categories().list_by_kind(CategoryKind::Place).unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Restaurant", "Café", "Bar", "Bakery", "Street Food", "Dessert"],
            "{}",
            label
        );
        assert!(
            store
                .categories()
                .list_by_kind(CategoryKind::Dish)
                .unwrap()
                .is_empty(),
            "{}",
            label
        );
    }
}

#[test]
fn test_author_is_a_singleton_upsert() {
    for (label, store) in open_stores() {
        assert!(store.author().get().unwrap().is_none(), "{}", label);

        let first = store
            .author()
            .save(placelog_core::NewAuthor::new("Ada"))
            .unwrap();
        let second = store
            .author()
            .save(placelog_core::NewAuthor::new("Grace").with_avatar("file:///a.png"))
            .unwrap();

        assert_eq!(first.id, second.id, "{}", label);
        assert_eq!(second.display_name, "Grace", "{}", label);
        assert_eq!(second.avatar_uri.as_deref(), Some("file:///a.png"), "{}", label);

        store.author().delete().unwrap();
        store.author().delete().unwrap();
        assert!(store.author().get().unwrap().is_none(), "{}", label);
    }
}

#[test]
fn test_reopening_a_disk_store_preserves_data() {
    let dir = tempfile::tempdir().unwrap();

    let place_id = {
        let store = Store::open(dir.path()).unwrap();
        let place = store
            .places()
            .create(NewPlace::new("Persistent", 10.0, 20.0))
            .unwrap();
        place.id
    };

    let store = Store::open(dir.path()).unwrap();
    let place = store.places().get(&place_id).unwrap().unwrap();
    assert_eq!(place.name, "Persistent");
    assert_eq!(place.latitude, 10.0);

    // Re-initialization did not duplicate the seeded taxonomy.
    let categories = store.categories().list_by_kind(CategoryKind::Place).unwrap();
    assert_eq!(categories.len(), 6);
}
