/*
 * Responsibility
 * - Transport-independent gateway logic (token validation, guards, audit)
 */
pub mod auth;
