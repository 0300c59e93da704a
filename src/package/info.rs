use crate::aur::RemoteRecord;
use crate::pkgbuild::BuildSpec;

/// Continuation indent for multi-line fields, aligned after the label.
const INDENT: &str = "                 ";

/// Renders recipe details in pacman's `-Si` layout.
///
/// AUR packages pass their RPC record, which takes precedence for the
/// fields the AUR reports itself.
pub fn render_spec_info(record: Option<&RemoteRecord>, spec: &BuildSpec) -> String {
    let joined = |v: &[String]| v.join(" ").trim().to_string();

    let (name, version, url, licenses, description) = match record {
        Some(r) => (
            r.name.clone(),
            r.version.clone(),
            r.url.clone().unwrap_or_default(),
            if r.license.is_empty() {
                joined(&spec.licenses)
            } else {
                r.license.join(" ")
            },
            r.description.clone().unwrap_or_default(),
        ),
        None => (
            spec.name.clone(),
            spec.version_string(),
            spec.url.clone(),
            joined(&spec.licenses),
            spec.description.clone(),
        ),
    };
    let install = if spec.has_install() { "Yes" } else { "No" };

    let mut fields: Vec<(&str, String)> = Vec::new();
    if record.is_some() {
        fields.push(("Repository", "aur".to_string()));
    }
    fields.extend([
        ("Name", name),
        ("Version", version),
        ("URL", url),
        ("Licenses", licenses),
        ("Groups", joined(&spec.groups)),
        ("Provides", joined(&spec.provides)),
        ("Depends On", joined(&spec.depends)),
        ("Make Depends", joined(&spec.make_depends)),
        ("Check Depends", joined(&spec.check_depends)),
        (
            "Optional Deps",
            spec.opt_depends.join(&format!("\n{}", INDENT)),
        ),
        ("Conflicts With", joined(&spec.conflicts)),
        ("Replaces", joined(&spec.replaces)),
        ("Architecture", joined(&spec.arch)),
        ("Install Script", install.to_string()),
        ("Description", description),
    ]);

    let mut out: String = fields
        .iter()
        .map(|(label, value)| format!("{:<15}: {}\n", label, value))
        .collect();
    out.push('\n');
    out
}
