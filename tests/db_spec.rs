use chrono::NaiveDate;
use slot_journal::calendar::MonthRef;
use slot_journal::db::{Database, DbError};
use slot_journal::models::*;
use speculate2::speculate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn create_test_concept(db: &Database, name: &str) -> Concept {
    db.create_concept(CreateConceptInput {
        name: name.to_string(),
        description: None,
    })
    .expect("Failed to create concept")
}

fn write(timeframe: Timeframe, concept_id: i64, position: u32, note: &str) -> SlotWrite {
    SlotWrite {
        timeframe,
        concept_id,
        position,
        note: note.to_string(),
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "concepts" {
        describe "create_concept" {
            it "creates an active concept with an empty description" {
                let concept = create_test_concept(&db, "FVG");

                assert_eq!(concept.name, "FVG");
                assert_eq!(concept.description, "");
                assert!(concept.is_active);
            }

            it "trims the name" {
                let concept = create_test_concept(&db, "  BOS  ");
                assert_eq!(concept.name, "BOS");
            }

            it "rejects a duplicate name" {
                create_test_concept(&db, "FVG");
                let err = db.create_concept(CreateConceptInput {
                    name: "FVG".to_string(),
                    description: Some("again".to_string()),
                }).expect_err("duplicate accepted");

                assert_eq!(
                    err.downcast_ref::<DbError>(),
                    Some(&DbError::DuplicateConcept("FVG".to_string()))
                );
            }

            it "rejects an empty or overlong name" {
                for name in ["   ".to_string(), "x".repeat(MAX_CONCEPT_NAME_CHARS + 1)] {
                    let err = db.create_concept(CreateConceptInput {
                        name,
                        description: None,
                    }).expect_err("invalid name accepted");
                    assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::Invalid(_))));
                }
            }
        }

        describe "list_active_concepts" {
            it "returns active concepts ordered by name" {
                create_test_concept(&db, "OTE");
                let hidden = create_test_concept(&db, "Displacement");
                create_test_concept(&db, "BOS");
                assert!(db.set_concept_active(hidden.id, false).expect("Update failed"));

                let names: Vec<String> = db
                    .list_active_concepts()
                    .expect("Query failed")
                    .into_iter()
                    .map(|c| c.name)
                    .collect();
                assert_eq!(names, vec!["BOS", "OTE"]);
            }
        }

        describe "get_concept" {
            it "returns None for a missing id" {
                assert!(db.get_concept(999).expect("Query failed").is_none());
            }

            it "returns inactive concepts too" {
                let concept = create_test_concept(&db, "Judas Swing");
                db.set_concept_active(concept.id, false).expect("Update failed");

                let found = db.get_concept(concept.id).expect("Query failed").expect("missing");
                assert!(!found.is_active);
            }
        }

        describe "seed_concepts" {
            it "creates only the missing names" {
                create_test_concept(&db, "BOS");
                let created = db.seed_concepts(&["BOS", "CHoCH", "FVG"]).expect("Seed failed");

                assert_eq!(created, 2);
                assert_eq!(db.list_active_concepts().expect("Query failed").len(), 3);
            }
        }
    }

    describe "journals" {
        describe "get_or_create_journal" {
            it "creates a journal with the default session" {
                let journal = db.get_or_create_journal(date(2026, 10, 19)).expect("Failed");

                assert_eq!(journal.date, date(2026, 10, 19));
                assert_eq!(journal.session, DEFAULT_SESSION);
                assert_eq!(journal.symbol, "");
                assert!(!journal.trade_taken);
            }

            it "returns the same journal on the second call" {
                let first = db.get_or_create_journal(date(2026, 10, 19)).expect("Failed");
                let second = db.get_or_create_journal(date(2026, 10, 19)).expect("Failed");
                assert_eq!(first.id, second.id);
            }
        }

        describe "get_journal" {
            it "does not create a journal" {
                assert!(db.get_journal(date(2026, 1, 1)).expect("Query failed").is_none());
                assert!(db.get_journal(date(2026, 1, 1)).expect("Query failed").is_none());
            }
        }

        describe "update_journal" {
            it "only changes the given fields" {
                let journal = db.update_journal(date(2026, 10, 19), UpdateDayJournalInput {
                    symbol: Some("NQ".to_string()),
                    trade_taken: Some(true),
                    ..Default::default()
                }).expect("Update failed");

                assert_eq!(journal.symbol, "NQ");
                assert!(journal.trade_taken);
                assert_eq!(journal.session, DEFAULT_SESSION);

                let journal = db.update_journal(date(2026, 10, 19), UpdateDayJournalInput {
                    general_notes: Some("Chop after 11".to_string()),
                    ..Default::default()
                }).expect("Update failed");

                assert_eq!(journal.symbol, "NQ");
                assert_eq!(journal.general_notes, "Chop after 11");
                let stored = db.get_journal(date(2026, 10, 19)).expect("Query failed").expect("missing");
                assert_eq!(stored.general_notes, "Chop after 11");
            }

            it "rejects an overlong symbol" {
                let err = db.update_journal(date(2026, 10, 19), UpdateDayJournalInput {
                    symbol: Some("S".repeat(MAX_SYMBOL_CHARS + 1)),
                    ..Default::default()
                }).expect_err("overlong symbol accepted");
                assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::Invalid(_))));
            }

            it "rejects a blank session" {
                let err = db.update_journal(date(2026, 10, 19), UpdateDayJournalInput {
                    session: Some(" ".to_string()),
                    ..Default::default()
                }).expect_err("blank session accepted");
                assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::Invalid(_))));
            }
        }

        describe "journal_dates_in_month" {
            it "returns only dates inside the month" {
                db.get_or_create_journal(date(2026, 9, 30)).expect("Failed");
                db.get_or_create_journal(date(2026, 10, 1)).expect("Failed");
                db.get_or_create_journal(date(2026, 10, 31)).expect("Failed");
                db.get_or_create_journal(date(2026, 11, 1)).expect("Failed");

                let dates = db
                    .journal_dates_in_month(MonthRef::new(2026, 10).expect("month"))
                    .expect("Query failed");
                assert_eq!(
                    dates.into_iter().collect::<Vec<_>>(),
                    vec![date(2026, 10, 1), date(2026, 10, 31)]
                );
            }
        }
    }

    describe "slots" {
        describe "get_day_view" {
            it "lists every timeframe in display order" {
                let view = db.get_day_view(date(2026, 10, 19)).expect("Failed");

                let keys: Vec<&str> = view.slots.iter().map(|s| s.timeframe.as_str()).collect();
                assert_eq!(keys, vec!["D", "4H", "1H", "15M", "5M", "1M"]);
                assert_eq!(view.slots[5].label, "1M (Optional)");
                assert!(view.slots.iter().all(|s| s.items.is_empty()));
            }
        }

        describe "replace_slot_items" {
            it "stores items in position order per timeframe" {
                let fvg = create_test_concept(&db, "FVG");
                let bos = create_test_concept(&db, "BOS");
                let day = date(2026, 10, 19);

                let written = db.replace_slot_items(day, &[
                    write(Timeframe::H1, bos.id, 1, "second"),
                    write(Timeframe::H1, fvg.id, 0, "first"),
                    write(Timeframe::Daily, fvg.id, 0, ""),
                ]).expect("Save failed");
                assert_eq!(written, 3);

                let view = db.get_day_view(day).expect("Failed");
                let daily = &view.slots[0];
                assert_eq!(daily.items.len(), 1);
                assert_eq!(daily.items[0].concept_name, "FVG");

                let hourly = &view.slots[2];
                let names: Vec<&str> = hourly.items.iter().map(|i| i.concept_name.as_str()).collect();
                assert_eq!(names, vec!["FVG", "BOS"]);
                assert_eq!(hourly.items[0].note, "first");
                assert_eq!(hourly.items[1].position, 1);
            }

            it "replaces everything saved before" {
                let fvg = create_test_concept(&db, "FVG");
                let day = date(2026, 10, 19);

                db.replace_slot_items(day, &[write(Timeframe::M5, fvg.id, 0, "")]).expect("Save failed");
                db.replace_slot_items(day, &[write(Timeframe::M15, fvg.id, 0, "")]).expect("Save failed");

                let view = db.get_day_view(day).expect("Failed");
                assert!(view.slots[4].items.is_empty());
                assert_eq!(view.slots[3].items.len(), 1);
            }

            it "allows the same concept twice in one slot" {
                let fvg = create_test_concept(&db, "FVG");
                let day = date(2026, 10, 19);

                db.replace_slot_items(day, &[
                    write(Timeframe::Daily, fvg.id, 0, "a"),
                    write(Timeframe::Daily, fvg.id, 1, "b"),
                ]).expect("Save failed");

                assert_eq!(db.get_day_view(day).expect("Failed").slots[0].items.len(), 2);
            }

            it "clears the day when given no items" {
                let fvg = create_test_concept(&db, "FVG");
                let day = date(2026, 10, 19);
                db.replace_slot_items(day, &[write(Timeframe::Daily, fvg.id, 0, "")]).expect("Save failed");

                assert_eq!(db.replace_slot_items(day, &[]).expect("Save failed"), 0);
                let view = db.get_day_view(day).expect("Failed");
                assert!(view.slots.iter().all(|s| s.items.is_empty()));
            }

            it "rolls back when a concept is inactive" {
                let fvg = create_test_concept(&db, "FVG");
                let hidden = create_test_concept(&db, "Hidden");
                db.set_concept_active(hidden.id, false).expect("Update failed");
                let day = date(2026, 10, 19);
                db.replace_slot_items(day, &[write(Timeframe::Daily, fvg.id, 0, "kept")]).expect("Save failed");

                let err = db.replace_slot_items(day, &[
                    write(Timeframe::H4, fvg.id, 0, ""),
                    write(Timeframe::H4, hidden.id, 1, ""),
                ]).expect_err("inactive concept accepted");

                assert_eq!(err.downcast_ref::<DbError>(), Some(&DbError::ConceptNotFound(hidden.id)));
                let view = db.get_day_view(day).expect("Failed");
                assert_eq!(view.slots[0].items.len(), 1);
                assert_eq!(view.slots[0].items[0].note, "kept");
                assert!(view.slots[1].items.is_empty());
            }

            it "rejects a concept that does not exist" {
                let err = db.replace_slot_items(date(2026, 10, 19), &[write(Timeframe::Daily, 404, 0, "")])
                    .expect_err("missing concept accepted");
                assert_eq!(err.downcast_ref::<DbError>(), Some(&DbError::ConceptNotFound(404)));
            }

            it "keeps other days untouched" {
                let fvg = create_test_concept(&db, "FVG");
                db.replace_slot_items(date(2026, 10, 19), &[write(Timeframe::Daily, fvg.id, 0, "")]).expect("Save failed");
                db.replace_slot_items(date(2026, 10, 20), &[]).expect("Save failed");

                let view = db.get_day_view(date(2026, 10, 19)).expect("Failed");
                assert_eq!(view.slots[0].items.len(), 1);
            }
        }
    }
}
