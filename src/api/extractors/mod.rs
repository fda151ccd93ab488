/*!
 * Request extractors
 *
 * Public API:
 * - CurrentIdentity
 */

mod identity;

pub use identity::CurrentIdentity;
