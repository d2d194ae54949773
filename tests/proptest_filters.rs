//! Property-based tests using proptest
//!
//! These tests verify filter formatting, descriptor compilation against the
//! account context, and envelope invariants using randomized inputs.

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use xbar::crossbar::context::AccountContext;
use xbar::crossbar::envelope::Envelope;
use xbar::crossbar::error::{Error, RemoteFailure};
use xbar::resource::compiler::Param;
use xbar::resource::{compile, format_filters, Descriptor, Mode, ResourceClass, FILTER_PREFIX};

/// Generate a Crossbar-style id (32 hex chars)
fn arb_id() -> impl Strategy<Value = String> {
    "[0-9a-f]{32}"
}

/// Generate filter pairs with arbitrary keys and values
fn arb_filters() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z_]{1,16}", "[ -~]{0,24}"), 0..10)
}

/// Generate an account-scoped collection class
fn arb_collection() -> impl Strategy<Value = ResourceClass> {
    prop_oneof![
        Just(ResourceClass::Users),
        Just(ResourceClass::Devices),
        Just(ResourceClass::Callflows),
        Just(ResourceClass::VMBoxes),
        Just(ResourceClass::Conferences),
        Just(ResourceClass::Menus),
        Just(ResourceClass::Cdrs),
    ]
}

fn arb_status() -> impl Strategy<Value = u16> {
    prop_oneof![Just(401u16), Just(403u16), Just(404u16), 400u16..500, 500u16..600]
}

mod filter_tests {
    use super::*;

    proptest! {
        /// Formatting keeps every pair, in order, with the prefix added
        #[test]
        fn test_format_filters_prefixes_every_key(filters in arb_filters()) {
            let formatted = format_filters(&filters);
            prop_assert_eq!(formatted.len(), filters.len());
            for ((key, value), (formatted_key, formatted_value)) in filters.iter().zip(&formatted) {
                prop_assert!(formatted_key.starts_with(FILTER_PREFIX));
                prop_assert_eq!(&formatted_key[FILTER_PREFIX.len()..], key.as_str());
                prop_assert_eq!(formatted_value, value);
            }
        }

        /// Filters reach the compiled call only when reading
        #[test]
        fn test_filters_only_in_read_mode(
            collection in arb_collection(),
            filters in prop::collection::vec(("[a-z_]{1,16}", "[a-z0-9]{1,8}"), 1..5),
        ) {
            let context = AccountContext::with_account("acct");
            let descriptor = Descriptor::account(None).then_filtered(collection, filters.clone());

            let read = compile(&descriptor, &context, Mode::Read).unwrap();
            prop_assert_eq!(&read.calls[1].param, &Param::Filters(format_filters(&filters)));

            let mutate = compile(&descriptor, &context, Mode::Mutate).unwrap();
            prop_assert_eq!(&mutate.calls[1].param, &Param::None);
        }
    }
}

mod context_tests {
    use super::*;

    proptest! {
        /// An omitted account always compiles to the current account
        #[test]
        fn test_omitted_account_resolves_to_context(current in arb_id(), collection in arb_collection()) {
            let context = AccountContext::with_account(&current);
            let chain = compile(&Descriptor::account(None).then(collection), &context, Mode::Read).unwrap();
            prop_assert_eq!(&chain.calls[0].param, &Param::Id(current));
        }

        /// An explicit account is never replaced by the context
        #[test]
        fn test_explicit_account_wins(current in arb_id(), explicit in arb_id()) {
            let context = AccountContext::with_account(&current);
            let chain = compile(&Descriptor::account(Some(explicit.as_str())), &context, Mode::Read).unwrap();
            prop_assert_eq!(&chain.calls[0].param, &Param::Id(explicit));
        }

        /// Deleting without a caller-supplied terminal id never compiles
        #[test]
        fn test_delete_needs_terminal_id(current in arb_id(), collection in arb_collection()) {
            let context = AccountContext::with_account(&current);
            let result = compile(&Descriptor::account(None).then(collection), &context, Mode::Delete);
            prop_assert!(matches!(result, Err(Error::MissingField("id"))));
        }
    }
}

mod envelope_tests {
    use super::*;

    proptest! {
        /// Every classified remote failure maps to a failure envelope with
        /// the same status; server errors stay fatal
        #[test]
        fn test_classified_failures_keep_status(status in arb_status(), message in "[a-z ]{1,20}") {
            let failure = RemoteFailure {
                status,
                message: message.clone(),
                errors: Map::new(),
                request_id: None,
            };

            match Error::from_status(failure).into_envelope() {
                Ok(envelope) => {
                    prop_assert!(status < 500);
                    prop_assert_eq!(envelope.error_status(), Some(status));

                    let wire = serde_json::to_value(&envelope).unwrap();
                    prop_assert_eq!(&wire["status"], "failure");
                    prop_assert_eq!(&wire["message"], &Value::String(message));
                    prop_assert!(wire.get("data").is_none());
                }
                Err(err) => {
                    prop_assert!(status >= 500);
                    prop_assert!(matches!(err, Error::Server(_)), "unexpected error kind");
                }
            }
        }

        /// A success envelope never carries failure fields
        #[test]
        fn test_success_has_no_error_fields(n in 0usize..20) {
            let items: Vec<Value> = (0..n).map(|i| json!({"id": i.to_string()})).collect();
            let envelope = Envelope::success(Value::Array(items));
            prop_assert_eq!(envelope.items().len(), n);

            let wire = serde_json::to_value(&envelope).unwrap();
            prop_assert_eq!(&wire["status"], "success");
            prop_assert!(wire.get("error").is_none());
            prop_assert!(wire.get("errors").is_none());
            prop_assert!(wire.get("message").is_none());
        }
    }
}
