//! Trend colors through guild roles.
//!
//! Guilds that want colored tickers create two roles, [`RED_ROLE`] and
//! [`GREEN_ROLE`]. On every tick the bot holds exactly the one matching the
//! current trend.

use tracing::debug;

use crate::retry::RetryPolicy;
use crate::session::Session;
use crate::{Result, TickerError};

/// Role held while the trend is down.
pub const RED_ROLE: &str = "tickers-red";

/// Role held while the trend is up.
pub const GREEN_ROLE: &str = "tickers-green";

/// Swaps `member_id` onto the role matching `increase` in `guild_id`.
///
/// The opposite role is removed before the matching one is added. Each
/// call runs under `policy` and the first failing call aborts the swap.
///
/// # Errors
///
/// Returns [`TickerError::RoleLookup`] if the roles cannot be listed or
/// either role is missing, and the push or timeout error of a failed role write.
pub async fn apply_trend_role(
    session: &dyn Session,
    policy: &RetryPolicy,
    guild_id: &str,
    member_id: &str,
    increase: bool,
) -> Result<()> {
    let roles = policy
        .run("list roles", || session.list_roles(guild_id))
        .await
        .map_err(|e| TickerError::RoleLookup(format!("guild {guild_id}: {e}")))?;

    let find = |name: &str| {
        roles
            .iter()
            .find(|role| role.name == name)
            .map(|role| role.id.clone())
            .ok_or_else(|| TickerError::RoleLookup(format!("guild {guild_id} has no {name} role")))
    };
    let red = find(RED_ROLE)?;
    let green = find(GREEN_ROLE)?;

    let (stale, current) = if increase {
        (red, green)
    } else {
        (green, red)
    };
    policy
        .run("remove role", || session.remove_role(guild_id, member_id, &stale))
        .await?;
    policy
        .run("add role", || session.add_role(guild_id, member_id, &current))
        .await?;
    debug!(guild_id, increase, "Applied trend role");
    Ok(())
}
