/// Decide whether a widget may load for the page that requested it.
///
/// An agent with no domains accepts every page. Requests without an
/// `Origin`/`Referer` are let through since they cannot be attributed.
/// Otherwise the origin has to contain one of the configured domains, or
/// one of the domains has to be the `*` wildcard.
pub fn is_origin_allowed(domains: &[String], origin: Option<&str>) -> bool {
    if domains.is_empty() {
        return true;
    }

    let origin = match origin.map(str::trim).filter(|o| !o.is_empty()) {
        Some(origin) => origin.to_ascii_lowercase(),
        None => return true,
    };

    domains
        .iter()
        .any(|domain| domain == "*" || origin.contains(domain.as_str()))
}
