//! Call-Chain Compiler
//!
//! Turns a [`Descriptor`] into a [`Chain`] of deferred accessor calls,
//! resolving the implicit account and each segment's addressing mode.

use super::descriptor::Descriptor;
use super::registry::{is_account_class, ResourceClass};
use crate::crossbar::context::AccountContext;
use crate::crossbar::error::Error;
use serde_json::Value;

/// Prefix Crossbar expects on filtered-list query parameters
pub const FILTER_PREFIX: &str = "filter_";

/// Execution mode a chain is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Mutate,
    Delete,
}

/// Resolved parameter of one accessor call
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    None,
    Id(String),
    /// Query pairs, keys already prefixed
    Filters(Vec<(String, String)>),
    Args(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub class: ResourceClass,
    pub param: Param,
}

/// Compiled descriptor, ready for the executor
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub calls: Vec<Call>,
    pub mode: Mode,
}

/// Prefix every filter key with `filter_`
pub fn format_filters(filters: &[(String, String)]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(key, value)| (format!("{}{}", FILTER_PREFIX, key), value.clone()))
        .collect()
}

/// Compile a descriptor against the account context as it is right now
pub fn compile(descriptor: &Descriptor, context: &AccountContext, mode: Mode) -> Result<Chain, Error> {
    if descriptor.is_empty() {
        return Err(Error::Descriptor("empty descriptor".to_string()));
    }

    // Deleting requires an id the caller chose, never a defaulted one
    if mode == Mode::Delete {
        if let Some(last) = descriptor.last() {
            if last.id.is_none() && last.args.is_none() {
                return Err(Error::MissingField("id"));
            }
        }
    }

    let mut calls = Vec::with_capacity(descriptor.segments().len());

    for segment in descriptor.segments() {
        let param = if let Some(args) = &segment.args {
            Param::Args(args.clone())
        } else if let Some(id) = &segment.id {
            Param::Id(id.clone())
        } else if is_account_class(segment.key) {
            let account_id = context
                .use_account_id()
                .ok_or(Error::MissingField("account_id"))?;
            Param::Id(account_id.to_string())
        } else if mode == Mode::Read && !segment.filters.is_empty() {
            Param::Filters(format_filters(&segment.filters))
        } else {
            Param::None
        };

        calls.push(Call {
            class: segment.key,
            param,
        });
    }

    Ok(Chain { calls, mode })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::descriptor::Segment;
    use serde_json::json;
    use ResourceClass::*;

    #[test]
    fn test_omitted_account_uses_context() {
        let context = AccountContext::with_account("acct-1");
        let chain = compile(&Descriptor::account(None).then(Users), &context, Mode::Read).unwrap();
        assert_eq!(chain.calls[0].param, Param::Id("acct-1".to_string()));
        assert_eq!(chain.calls[1].param, Param::None);
    }

    #[test]
    fn test_context_is_read_at_compile_time() {
        let descriptor = Descriptor::account(None).then(Devices);
        let mut context = AccountContext::with_account("first");
        let first = compile(&descriptor, &context, Mode::Read).unwrap();

        context.use_account("second");
        let second = compile(&descriptor, &context, Mode::Read).unwrap();

        assert_eq!(first.calls[0].param, Param::Id("first".to_string()));
        assert_eq!(second.calls[0].param, Param::Id("second".to_string()));
    }

    #[test]
    fn test_explicit_account_wins() {
        let context = AccountContext::with_account("current");
        let chain = compile(&Descriptor::account(Some("other")), &context, Mode::Read).unwrap();
        assert_eq!(chain.calls[0].param, Param::Id("other".to_string()));
    }

    #[test]
    fn test_missing_account_context() {
        let result = compile(&Descriptor::account(None), &AccountContext::new(), Mode::Read);
        assert!(matches!(result, Err(Error::MissingField("account_id"))));
    }

    #[test]
    fn test_filters_prefixed_in_read_mode() {
        let context = AccountContext::with_account("a");
        let descriptor = Descriptor::account(None).then_filtered(Users, [("username", "bob")]);
        let chain = compile(&descriptor, &context, Mode::Read).unwrap();
        assert_eq!(
            chain.calls[1].param,
            Param::Filters(vec![("filter_username".to_string(), "bob".to_string())])
        );
    }

    #[test]
    fn test_filters_ignored_when_writing() {
        let context = AccountContext::with_account("a");
        let descriptor = Descriptor::account(None).then_filtered(User, [("username", "bob")]);
        let chain = compile(&descriptor, &context, Mode::Mutate).unwrap();
        assert_eq!(chain.calls[1].param, Param::None);
    }

    #[test]
    fn test_args_take_precedence() {
        let context = AccountContext::with_account("a");
        let segment = Segment::new(Stats)
            .id("ignored")
            .filter("also", "ignored")
            .args(vec![json!({"status": "waiting"})]);
        let descriptor = Descriptor::account(None).then(Queues).segment(segment);
        let chain = compile(&descriptor, &context, Mode::Read).unwrap();
        assert_eq!(
            chain.calls[2].param,
            Param::Args(vec![json!({"status": "waiting"})])
        );
    }

    #[test]
    fn test_delete_requires_terminal_id() {
        let context = AccountContext::with_account("a");

        let result = compile(&Descriptor::account(None).then(User), &context, Mode::Delete);
        assert!(matches!(result, Err(Error::MissingField("id"))));

        // A defaulted account is not a caller-supplied id
        let result = compile(&Descriptor::account(None), &context, Mode::Delete);
        assert!(matches!(result, Err(Error::MissingField("id"))));

        let chain = compile(&Descriptor::account(None).then_id(User, "u1"), &context, Mode::Delete)
            .unwrap();
        assert_eq!(chain.calls[1].param, Param::Id("u1".to_string()));
    }

    #[test]
    fn test_empty_descriptor() {
        let result = compile(&Descriptor::new(), &AccountContext::new(), Mode::Read);
        assert!(matches!(result, Err(Error::Descriptor(_))));
    }
}
