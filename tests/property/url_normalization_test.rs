//! Property-based tests for URL normalization.
//!
//! Two URLs that differ only by scheme/host case, a leading `www.`, or a
//! trailing slash must always collapse to the same duplicate key, and
//! normalization must be idempotent.

use linkvault::services::duplicate_resolver::{DuplicateResolver, DuplicateResolverTrait};
use proptest::prelude::*;

fn arb_scheme() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("http"), Just("https")]
}

fn arb_host() -> impl Strategy<Value = String> {
    // "www" itself is excluded: a host of exactly www.<tld> would lose its
    // whole name to the prefix strip and no longer compare against variants
    ("[a-z][a-z0-9]{2,12}", prop_oneof![Just("com"), Just("org"), Just("io")])
        .prop_filter("host label must not be www", |(label, _)| label != "www")
        .prop_map(|(label, tld)| format!("{}.{}", label, tld))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normalization_ignores_case_www_and_trailing_slash(
        scheme in arb_scheme(),
        host in arb_host(),
        path in proptest::option::of("[a-z0-9]{1,8}"),
        use_www: bool,
        uppercase: bool,
        trailing_slash: bool,
    ) {
        let resolver = DuplicateResolver::new();

        let canonical = match &path {
            Some(p) => format!("{}://{}/{}", scheme, host, p),
            None => format!("{}://{}", scheme, host),
        };

        let mut variant_host = if use_www {
            format!("www.{}", host)
        } else {
            host.clone()
        };
        let mut variant_scheme = scheme.to_string();
        if uppercase {
            variant_host = variant_host.to_uppercase();
            variant_scheme = variant_scheme.to_uppercase();
        }
        let mut variant = match &path {
            Some(p) => format!("{}://{}/{}", variant_scheme, variant_host, p),
            None => format!("{}://{}", variant_scheme, variant_host),
        };
        if trailing_slash {
            variant.push('/');
        }

        prop_assert_eq!(
            resolver.normalize_url(&variant),
            resolver.normalize_url(&canonical),
            "variant '{}' should collapse to canonical '{}'",
            variant,
            canonical
        );
    }

    #[test]
    fn normalization_is_idempotent(
        scheme in arb_scheme(),
        host in arb_host(),
        path in proptest::option::of("[a-z0-9]{1,8}"),
        trailing_slash: bool,
    ) {
        let resolver = DuplicateResolver::new();
        let mut url = match &path {
            Some(p) => format!("{}://www.{}/{}", scheme, host, p),
            None => format!("{}://www.{}", scheme, host),
        };
        if trailing_slash {
            url.push('/');
        }

        let once = resolver.normalize_url(&url);
        let twice = resolver.normalize_url(&once);
        prop_assert_eq!(once, twice);
    }
}
