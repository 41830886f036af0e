use {
    super::{Count, Mode, RawLock},
    crate::auth::{Authorization, DenyAll},
};

#[cfg(test)]
mod tests;

/// A lock that is permanently broken.
///
/// Every acquisition and every release is denied. Mostly a curiosity, but
/// handy for exercising the failure paths of code built on top.
#[derive(Default, Debug)]
pub struct Broken;

impl Broken {
    pub const fn new() -> Self {
        Self
    }
}

impl RawLock for Broken {
    fn acquire(
        &self,
        _auth: Option<&Authorization>,
        _mode: Mode,
        _blocking: bool,
        _test: bool,
    ) -> Option<Count> {
        None
    }

    fn release(&self, _auth: Option<&Authorization>, _mode: Mode, _test: bool) -> Option<Count> {
        None
    }
}

impl super::MatchedPolicy for Broken {
    type Policy = DenyAll;
}
