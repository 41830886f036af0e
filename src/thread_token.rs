#[cfg(test)]
mod tests;

/// Returns a token identifying the current thread.
///
/// The token is never 0, so 0 can be used as "no thread" in owner fields.
///
/// A token may be handed out again after its thread has terminated, but two
/// threads that return the same token can never run concurrently: the end of
/// one happens before the start of the other. That is exactly the property
/// the owner checks in the lock state machines rely on, so recycling is
/// harmless there.
#[inline(always)]
pub(crate) fn thread_token() -> usize {
    thread_local!(static TOKEN: u8 = const { 0 });
    TOKEN.with(|token| {
        let token: *const u8 = token;
        token as usize
    })
}
