//! Skip-list resolution for a single playbook.

use tracing::info;
use vigil_config::{HostSelector, SkipList};

/// What to do with a playbook given the skip list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipDecision {
  /// Do not run the playbook at all.
  Skip,
  /// Run the playbook with this host limit.
  Run { limit_hosts: Option<String> },
}

/// Resolve the skip list entry for `playbook` against `limit_hosts`.
///
/// - Listed with `ALL` hosts: the playbook is skipped.
/// - Listed with specific hosts: every skipped host is negated (`!host`)
///   and followed by the entries of `limit_hosts` that do not name a
///   skipped host.
/// - Not listed: `limit_hosts` is passed through.
pub fn skip_playbook(skip_list: &SkipList, playbook: &str, limit_hosts: Option<&str>) -> SkipDecision {
  let unchanged = SkipDecision::Run {
    limit_hosts: limit_hosts.map(String::from),
  };

  let Some(entry) = skip_list.get(playbook) else {
    return unchanged;
  };

  let reason = entry.reason.as_deref().unwrap_or_default();
  let lp = entry.lp.as_deref().unwrap_or_default();
  let skipped = match &entry.hosts {
    HostSelector::All => {
      info!(validation = playbook, reason, lp, "validation skipped on all hosts");
      return SkipDecision::Skip;
    }
    HostSelector::Subset(hosts) if hosts.is_empty() => return unchanged,
    HostSelector::Subset(hosts) => hosts,
  };
  info!(
    validation = playbook,
    hosts = %entry.hosts,
    reason,
    lp,
    "validation skipped on some hosts"
  );

  let mut pattern: Vec<String> = skipped.iter().map(|host| format!("!{}", host)).collect();
  if let Some(limit) = limit_hosts {
    pattern.extend(
      limit
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .filter(|host| {
          let bare = host.trim_start_matches('!');
          !skipped.iter().any(|s| s == bare)
        })
        .map(String::from),
    );
  }

  SkipDecision::Run {
    limit_hosts: Some(pattern.join(",")),
  }
}
