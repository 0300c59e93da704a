//! Install ordering.
//!
//! Packages are installed local first, then official, then AUR, then
//! unbuilt recipes, by name within a kind. A package that another member
//! of the same set depends on is always placed before its dependant,
//! whatever its kind.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use futures_util::future::try_join_all;
use log::debug;

use super::{Kind, Package, strip_constraint};
use crate::resolver::Resolver;

/// Orders `pkgs` for installation, reading each one's declared dependencies.
pub async fn sort_for_install(
    pkgs: Vec<Arc<Package>>,
    resolver: &Resolver,
) -> Result<Vec<Arc<Package>>> {
    let declared = try_join_all(pkgs.iter().map(|p| p.declared_dependencies(resolver))).await?;
    Ok(install_order(pkgs, &declared))
}

/// Orders `pkgs` given `declared[i]`, the dependency names of `pkgs[i]`.
///
/// Dependencies come first; otherwise packages are ordered by [`Kind`] and
/// name. A dependency cycle is broken at its lowest-ranked member.
pub fn install_order(pkgs: Vec<Arc<Package>>, declared: &[Vec<String>]) -> Vec<Arc<Package>> {
    let n = pkgs.len();
    let key = |i: usize| (pkgs[i].kind(), pkgs[i].name().to_string(), i);

    // successors[d] lists the packages that must wait for d.
    let mut successors = vec![Vec::new(); n];
    let mut pending = vec![0usize; n];
    for (p, names) in declared.iter().enumerate().take(n) {
        for d in 0..n {
            if d == p {
                continue;
            }
            let name = pkgs[d].name();
            if names.iter().any(|dep| strip_constraint(dep) == name) {
                successors[d].push(p);
                pending[p] += 1;
            }
        }
    }

    let mut ready: BTreeSet<(Kind, String, usize)> =
        (0..n).filter(|&i| pending[i] == 0).map(key).collect();
    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while order.len() < n {
        let next = match ready.pop_first() {
            Some((_, _, i)) => i,
            None => {
                let Some((_, name, i)) = (0..n).filter(|&i| !placed[i]).map(key).min() else {
                    break;
                };
                debug!("Dependency cycle, placing {} first", name);
                i
            }
        };
        if placed[next] {
            continue;
        }
        placed[next] = true;
        order.push(next);

        for &s in &successors[next] {
            pending[s] = pending[s].saturating_sub(1);
            if pending[s] == 0 && !placed[s] {
                ready.insert(key(s));
            }
        }
    }

    let mut slots: Vec<Option<Arc<Package>>> = pkgs.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}
