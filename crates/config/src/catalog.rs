//! Built-in catalog of check configuration kinds.
//!
//! Each entry pairs the current schema of a check family with the rules that
//! lift its older persisted shapes. The catalog is registered explicitly by
//! `register_builtin`; nothing here is global state.

use crate::registry::{RegistryError, RuleRegistry, RuleRegistryBuilder};
use checkconf_domain::{
    CascadingChoice, FieldSpec, PackSpec, Pattern, RuleChain, RuleChainError, Schema,
    SchemaError, SchemaVersion, TransformRule, ValueMapper, ValueSpec,
};
use serde_json::{Value, json};

type ChainFactory = fn() -> Result<RuleChain, RuleChainError>;

const SECONDS_PER_DAY: i64 = 86_400;

/// Kinds shipped with the tool: `(name, title, factory)`.
const BUILTIN_KINDS: [(&str, &str, ChainFactory); 9] = [
    ("custom_checks", "Integrate Nagios plugins", custom_checks),
    ("active_checks:bi_aggr", "Check state of BI aggregation", bi_aggr),
    ("active_checks:form_submit", "Check HTML form submission", form_submit),
    ("active_checks:notify_count", "Check notification number per contact", notify_count),
    ("active_checks:traceroute", "Check current routing", traceroute),
    ("active_checks:by_ssh", "Check via SSH service", by_ssh),
    (
        "active_checks:elasticsearch_query",
        "Query Elasticsearch logs",
        elasticsearch_query,
    ),
    ("checkgroup_parameters:ups_test", "Time since last UPS selftest", ups_test),
    (
        "checkgroup_parameters:juniper_mem_modules",
        "Juniper memory usage per module",
        juniper_mem_modules,
    ),
];

/// Register every built-in kind.
pub fn register_builtin(builder: &mut RuleRegistryBuilder) -> Result<(), RegistryError> {
    for (name, title, factory) in BUILTIN_KINDS {
        let chain = factory().map_err(|error| RegistryError::InvalidChain {
            kind: name.to_string(),
            error,
        })?;
        builder.register(name, Some(title), chain)?;
    }
    Ok(())
}

/// A registry holding only the built-in kinds.
pub fn builtin_registry() -> Result<RuleRegistry, RegistryError> {
    let mut builder = RuleRegistry::builder();
    register_builtin(&mut builder)?;
    Ok(builder.build())
}

fn v(version: u32) -> SchemaVersion {
    SchemaVersion::new(version)
}

fn choices<const N: usize>(values: [Value; N]) -> ValueSpec {
    ValueSpec::choice(values)
}

fn integer_pair() -> ValueSpec {
    ValueSpec::tuple(vec![ValueSpec::integer(), ValueSpec::integer()])
}

fn port() -> ValueSpec {
    ValueSpec::integer().min(1.0).max(65_535.0)
}

fn pattern(name: &str, source: &str) -> Result<Pattern, SchemaError> {
    Pattern::new(source).map_err(|error| SchemaError::invalid_pattern(name, &error))
}

// =============================================================================
// ACTIVE CHECKS
// =============================================================================

fn custom_checks() -> Result<RuleChain, RuleChainError> {
    let freshness = ValueSpec::mapping(vec![
        FieldSpec::required("interval", ValueSpec::integer().min(1.0))
            .titled("Expected update interval"),
        FieldSpec::required("state", choices([json!(0), json!(1), json!(2), json!(3)]))
            .titled("State in case of absent updates"),
        FieldSpec::required("output", ValueSpec::text().non_empty())
            .titled("Plugin output in case of absent updates"),
    ]);
    let schema = Schema::new(
        v(1),
        vec![
            FieldSpec::required("service_description", ValueSpec::text().non_empty())
                .titled("Service description"),
            FieldSpec::optional("command_line", ValueSpec::text()).titled("Command line"),
            FieldSpec::optional("command_name", ValueSpec::text())
                .titled("Internal command name"),
            FieldSpec::optional("has_perfdata", choices([json!(true)]))
                .titled("Performance data"),
            FieldSpec::optional("freshness", freshness)
                .titled("Check freshness")
                .with_help("Only applies to passive checks"),
        ],
    )?;
    RuleChain::new(schema, Vec::new())
}

fn bi_aggr() -> Result<RuleChain, RuleChainError> {
    let credentials = ValueSpec::cascading(vec![
        CascadingChoice::bare("automation"),
        CascadingChoice::with_payload(
            "configured",
            ValueSpec::tuple(vec![
                ValueSpec::text(),
                ValueSpec::password_reference().non_empty(),
            ]),
        ),
    ]);
    let state_override = || choices([json!(null), json!("ok"), json!("warn")]);
    let optional = ValueSpec::mapping(vec![
        FieldSpec::optional(
            "auth_mode",
            choices([json!("cookie"), json!("basic"), json!("digest"), json!("kerberos")]),
        )
        .titled("Authentication mode"),
        FieldSpec::optional("timeout", ValueSpec::integer().min(1.0))
            .titled("Seconds before connection times out"),
        FieldSpec::optional("in_downtime", state_override())
            .titled("State, if BI aggregate is in scheduled downtime"),
        FieldSpec::optional("acknowledged", state_override())
            .titled("State, if BI aggregate is acknowledged"),
        FieldSpec::optional("track_downtimes", ValueSpec::boolean()).titled("Track downtimes"),
    ]);
    let schema = Schema::new(
        v(2),
        vec![
            FieldSpec::required("base_url", ValueSpec::text().non_empty())
                .titled("Base URL (OMD Site)"),
            FieldSpec::required("aggregation_name", ValueSpec::text().non_empty())
                .titled("Aggregation name"),
            FieldSpec::required("credentials", credentials).titled("Login credentials"),
            FieldSpec::required("optional", optional).titled("Optional parameters"),
        ],
    )?;
    let rules = vec![TransformRule::shape_with_packs(
        ["base_url", "aggregation_name", "user", "secret", "optional"],
        vec![PackSpec::new(
            "credentials",
            ["user", "secret"],
            ValueMapper::Tagged {
                tag: "configured".to_string(),
            },
        )],
    )];
    RuleChain::new(schema, rules)
}

fn form_submit() -> Result<RuleChain, RuleChainError> {
    let tls = choices([json!("no_tls"), json!("tls_standard"), json!("tls_no_cert_valid")]);
    let params = ValueSpec::mapping(vec![
        FieldSpec::optional("hosts", ValueSpec::list_of(ValueSpec::text().non_empty()))
            .titled("Check specific hosts"),
        FieldSpec::optional(
            "uri",
            ValueSpec::text()
                .non_empty()
                .pattern(pattern("params.uri", "^/.*")?),
        )
        .titled("URI to fetch")
        .with_default(json!("/")),
        FieldSpec::optional("port", port())
            .titled("TCP port")
            .with_default(json!(80)),
        FieldSpec::optional("tls_configuration", tls).titled("TLS/HTTPS configuration"),
        FieldSpec::optional("timeout", ValueSpec::integer().min(1.0))
            .titled("Seconds before connection times out")
            .with_default(json!(10)),
        FieldSpec::optional("expect_regex", ValueSpec::text())
            .titled("Regular expression to expect in content"),
        FieldSpec::optional("form_name", ValueSpec::text())
            .titled("Name of the form to populate"),
        FieldSpec::optional("query", ValueSpec::text()).titled("Send HTTP POST data"),
        FieldSpec::optional("num_succeeded", integer_pair())
            .titled("Multiple hosts: number of successful results"),
    ]);
    let schema = Schema::new(
        v(2),
        vec![
            FieldSpec::required("name", ValueSpec::text().non_empty())
                .titled("Name")
                .with_help("Used in the service description"),
            FieldSpec::required("params", params).titled("Check the URL"),
        ],
    )?;
    let rules = vec![
        TransformRule::shape(["name", "params"]),
        TransformRule::rename_within(
            ["params"],
            "ssl",
            "tls_configuration",
            ValueMapper::Constant {
                value: json!("tls_standard"),
            },
        ),
    ];
    RuleChain::new(schema, rules)
}

fn notify_count() -> Result<RuleChain, RuleChainError> {
    let optional = ValueSpec::mapping(vec![
        FieldSpec::optional("num_per_contact", integer_pair())
            .titled("Thresholds for notifications per contact"),
    ]);
    let schema = Schema::new(
        v(2),
        vec![
            FieldSpec::required("description", ValueSpec::text().non_empty())
                .titled("Service description"),
            FieldSpec::required("interval", ValueSpec::integer().min(1.0))
                .titled("Interval to monitor (minutes)"),
            FieldSpec::optional("optional", optional).titled("Optional parameters"),
        ],
    )?;
    let rules = vec![TransformRule::shape(["description", "interval", "optional"])];
    RuleChain::new(schema, rules)
}

fn traceroute() -> Result<RuleChain, RuleChainError> {
    let router = ValueSpec::tuple(vec![
        ValueSpec::text().non_empty(),
        choices([json!("W"), json!("C"), json!("w"), json!("c")]),
    ]);
    let schema = Schema::new(
        v(2),
        vec![
            FieldSpec::required("dns", ValueSpec::boolean()).titled("Name resolution"),
            FieldSpec::required(
                "address_family",
                choices([json!(null), json!("ipv4"), json!("ipv6")]),
            )
            .titled("IP address family"),
            FieldSpec::required("routers", ValueSpec::list_of(router))
                .titled("Router (FQDN, IP-Address)"),
            FieldSpec::required("method", choices([json!(null), json!("icmp"), json!("tcp")]))
                .titled("Method of probing"),
        ],
    )?;
    let rules = vec![TransformRule::default_fill("address_family", json!(null))];
    RuleChain::new(schema, rules)
}

fn by_ssh() -> Result<RuleChain, RuleChainError> {
    let optional = ValueSpec::mapping(vec![
        FieldSpec::optional("description", ValueSpec::text()).titled("Service description"),
        FieldSpec::optional("hostname", ValueSpec::text().non_empty())
            .titled("DNS hostname or IP address")
            .with_default(json!("$HOSTADDRESS$")),
        FieldSpec::optional("port", port()).titled("SSH port").with_default(json!(22)),
        FieldSpec::optional("ip_version", choices([json!("ipv4"), json!("ipv6")]))
            .titled("IP-Version"),
        FieldSpec::optional("timeout", ValueSpec::integer().min(1.0))
            .titled("Seconds before connection times out")
            .with_default(json!(10)),
        FieldSpec::optional("logname", ValueSpec::text()).titled("Username"),
        FieldSpec::optional("identity", ValueSpec::text()).titled("Keyfile"),
        FieldSpec::optional("accept_new_host_keys", choices([json!(true)]))
            .titled("Enable automatic host key acceptance"),
    ]);
    let schema = Schema::new(
        v(2),
        vec![
            FieldSpec::required("command", ValueSpec::text().non_empty()).titled("Command"),
            FieldSpec::optional("optional", optional).titled("Optional parameters"),
        ],
    )?;
    let rules = vec![TransformRule::shape(["command", "optional"])];
    RuleChain::new(schema, rules)
}

fn elasticsearch_query() -> Result<RuleChain, RuleChainError> {
    let names = || ValueSpec::list_of(ValueSpec::text().non_empty()).non_empty();
    let schema = Schema::new(
        v(1),
        vec![
            FieldSpec::required("svc_item", ValueSpec::text().non_empty()).titled("Item suffix"),
            FieldSpec::required("pattern", ValueSpec::text().non_empty()).titled("Search pattern"),
            FieldSpec::required("timerange", ValueSpec::duration().min(1.0))
                .titled("Time range")
                .with_help("Seconds to look back for matching documents"),
            FieldSpec::optional("hostname", ValueSpec::text().non_empty())
                .titled("Alternative hostname"),
            FieldSpec::optional("user", ValueSpec::text()).titled("Username"),
            FieldSpec::optional("password", ValueSpec::password_reference().non_empty())
                .titled("Password"),
            FieldSpec::optional("protocol", choices([json!("http"), json!("https")]))
                .titled("Protocol")
                .with_default(json!("https")),
            FieldSpec::optional("port", port()).titled("Port").with_default(json!(9200)),
            FieldSpec::optional("index", names()).titled("Index"),
            FieldSpec::optional("fieldname", names()).titled("Field name"),
            FieldSpec::optional("count", integer_pair()).titled("Thresholds on message count"),
        ],
    )?;
    RuleChain::new(schema, Vec::new())
}

// =============================================================================
// CHECK PARAMETERS
// =============================================================================

fn ups_test() -> Result<RuleChain, RuleChainError> {
    let schema = Schema::new(
        v(2),
        vec![
            FieldSpec::optional(
                "levels_elapsed_time",
                ValueSpec::tuple(vec![ValueSpec::duration(), ValueSpec::duration()]).nullable(),
            )
            .titled("Time since last UPS selftest"),
        ],
    )?;
    let rules = vec![TransformRule::shape_with_packs(
        ["warn_days", "crit_days"],
        vec![PackSpec::new(
            "levels_elapsed_time",
            ["warn_days", "crit_days"],
            ValueMapper::Scale {
                factor: SECONDS_PER_DAY,
                null_if_all_zero: true,
            },
        )],
    )];
    RuleChain::new(schema, rules)
}

fn juniper_mem_modules() -> Result<RuleChain, RuleChainError> {
    let percent = || ValueSpec::float().min(0.0).max(100.0);
    let schema = Schema::new(
        v(2),
        vec![
            FieldSpec::optional("warn", percent())
                .titled("Warning at a memory usage of")
                .with_default(json!(80.0)),
            FieldSpec::optional("crit", percent())
                .titled("Critical at a memory usage of")
                .with_default(json!(90.0)),
        ],
    )?;
    let rules = vec![TransformRule::shape(["warn", "crit"])];
    RuleChain::new(schema, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkconf_domain::{NormalizationError, RawConfig};
    use std::error::Error;

    fn chain_for(kind: &str) -> Result<RuleChain, Box<dyn Error>> {
        let (_, _, factory) = BUILTIN_KINDS
            .into_iter()
            .find(|(name, _, _)| *name == kind)
            .ok_or("kind not in catalog")?;
        Ok(factory()?)
    }

    #[test]
    fn every_builtin_kind_is_consistent() -> Result<(), Box<dyn Error>> {
        let registry = builtin_registry()?;
        assert_eq!(registry.len(), BUILTIN_KINDS.len());
        for (name, title, _) in BUILTIN_KINDS {
            let entry = registry.resolve(name)?;
            assert_eq!(entry.title(), Some(title));
        }
        Ok(())
    }

    #[test]
    fn registering_twice_reports_duplicates() -> Result<(), Box<dyn Error>> {
        let mut builder = RuleRegistry::builder();
        register_builtin(&mut builder)?;
        let again = register_builtin(&mut builder);
        assert!(matches!(
            again,
            Err(RegistryError::DuplicateKind { ref kind }) if kind == "custom_checks"
        ));
        Ok(())
    }

    #[test]
    fn notify_count_legacy_triple_is_lifted() -> Result<(), Box<dyn Error>> {
        let chain = chain_for("active_checks:notify_count")?;
        let config = chain.normalize(RawConfig::new(json!(["Notifications", 60, {}])))?;
        assert_eq!(config.get("description"), Some(&json!("Notifications")));
        assert_eq!(config.get("interval"), Some(&json!(60)));
        assert_eq!(config.get("optional"), Some(&json!({})));
        Ok(())
    }

    #[test]
    fn by_ssh_rejects_out_of_range_ports() -> Result<(), Box<dyn Error>> {
        let chain = chain_for("active_checks:by_ssh")?;
        let result = chain.normalize(RawConfig::new(json!(["uptime", {"port": 70000}])));
        assert!(matches!(
            result,
            Err(NormalizationError::ConstraintViolation { ref name, .. }) if name == "optional.port"
        ));
        Ok(())
    }

    #[test]
    fn form_submit_uri_must_be_absolute() -> Result<(), Box<dyn Error>> {
        let chain = chain_for("active_checks:form_submit")?;
        let result = chain.normalize(RawConfig::new(json!(["Login", {"uri": "login"}])));
        assert!(matches!(
            result,
            Err(NormalizationError::ConstraintViolation { ref name, .. }) if name == "params.uri"
        ));
        Ok(())
    }

    #[test]
    fn form_submit_persisted_pair_migrates_ssl() -> Result<(), Box<dyn Error>> {
        let chain = chain_for("active_checks:form_submit")?;
        let raw = RawConfig::new(json!(["My form", {"uri": "/", "ssl": true}]));
        let config = chain.normalize(raw)?;
        assert_eq!(
            config.to_value(),
            json!({
                "name": "My form",
                "params": {"uri": "/", "tls_configuration": "tls_standard"}
            })
        );

        let migrated = json!(["My form", {"uri": "/", "tls_configuration": "no_tls"}]);
        let config = chain.normalize(RawConfig::new(migrated))?;
        assert_eq!(
            config.get("params"),
            Some(&json!({"uri": "/", "tls_configuration": "no_tls"}))
        );

        let result = chain.normalize(RawConfig::new(json!({"uri": "/", "ssl": true})));
        assert!(matches!(result, Err(NormalizationError::UnknownField { .. })));
        Ok(())
    }

    #[test]
    fn juniper_thresholds_are_percentages() -> Result<(), Box<dyn Error>> {
        let chain = chain_for("checkgroup_parameters:juniper_mem_modules")?;
        let config = chain.normalize(RawConfig::new(json!([80.0, 90.0])))?;
        assert_eq!(config.get("warn"), Some(&json!(80.0)));

        let result = chain.normalize(RawConfig::new(json!({"warn": 120.0})));
        assert!(matches!(result, Err(NormalizationError::ConstraintViolation { .. })));
        Ok(())
    }
}
