//! Dining Philosophers exerciser for the locking containers.
//!
//! Each philosopher grabs the chopstick to their left for writing, dawdles,
//! and then asks for the one to their right for reading. Without deadlock
//! prevention that stalls in seconds; with an authorization, a meta-lock, or
//! ordered locks, every philosopher eventually eats. The process exits 0 on
//! success and 3 when the watchdog decides the table has deadlocked.

use {
    custody::{
        auth::{Authorization, ExclusiveTracking, MultiReadOneWrite, OrderedPolicy},
        lock::{ExclusiveOnly, Ordered, SharedExclusive, Untracked},
        MetaLock, Order, Protected, ReadProxy, WriteProxy,
    },
    std::{
        env, process,
        sync::{
            atomic::{AtomicBool, Ordering::SeqCst},
            Arc, Barrier,
        },
        thread,
        time::{Duration, Instant},
    },
};

const SUCCESS: i32 = 0;
const ERROR_ARGS: i32 = 1;
const ERROR_THREAD: i32 = 2;
const ERROR_DEADLOCK: i32 = 3;
const ERROR_LOGIC: i32 = 4;
const ERROR_SYSTEM: i32 = 5;

#[derive(Clone, Copy, PartialEq)]
enum Method {
    Unsafe,
    Auth,
    Multi,
    Ordered,
}

#[derive(Clone, Copy)]
enum LockKind {
    SharedExclusive,
    ExclusiveOnly,
    Untracked,
}

#[derive(Clone, Copy)]
enum AuthKind {
    MultiReadOneWrite,
    ExclusiveTracking,
    OrderedMultiReadOneWrite,
    OrderedExclusiveTracking,
}

struct Config {
    threads: usize,
    method: Method,
    deadlock: bool,
    lock_kind: LockKind,
    auth_kind: AuthKind,
    timeout: u64,
}

#[derive(Clone)]
struct Chopstick {
    value: i64,
    retries: u64,
}

impl Default for Chopstick {
    fn default() -> Self {
        Self {
            value: -1,
            retries: 0,
        }
    }
}

/// One concrete container per lock configuration, so every philosopher can
/// handle any table the command line asks for.
enum Chop {
    Rw(Protected<Chopstick, SharedExclusive>),
    Excl(Protected<Chopstick, ExclusiveOnly>),
    Dumb(Protected<Chopstick, Untracked>),
    OrderedRw(Protected<Chopstick, Ordered<SharedExclusive>>),
    OrderedExcl(Protected<Chopstick, Ordered<ExclusiveOnly>>),
    OrderedDumb(Protected<Chopstick, Ordered<Untracked>>),
}

impl Chop {
    fn new(kind: LockKind, ordered: bool, order: Order) -> Self {
        let value = Chopstick::default();
        match (kind, ordered) {
            (LockKind::SharedExclusive, false) => Chop::Rw(Protected::new(value)),
            (LockKind::ExclusiveOnly, false) => Chop::Excl(Protected::new(value)),
            (LockKind::Untracked, false) => Chop::Dumb(Protected::new(value)),
            (LockKind::SharedExclusive, true) => Chop::OrderedRw(Protected::with_lock(
                value,
                Ordered::new(SharedExclusive::new(), order),
            )),
            (LockKind::ExclusiveOnly, true) => Chop::OrderedExcl(Protected::with_lock(
                value,
                Ordered::new(ExclusiveOnly::new(), order),
            )),
            (LockKind::Untracked, true) => Chop::OrderedDumb(Protected::with_lock(
                value,
                Ordered::new(Untracked::new(), order),
            )),
        }
    }

    fn order(&self) -> Order {
        match self {
            Chop::Rw(c) => c.order(),
            Chop::Excl(c) => c.order(),
            Chop::Dumb(c) => c.order(),
            Chop::OrderedRw(c) => c.order(),
            Chop::OrderedExcl(c) => c.order(),
            Chop::OrderedDumb(c) => c.order(),
        }
    }

    fn get_write(&self) -> Option<WriteProxy<'_, Chopstick>> {
        match self {
            Chop::Rw(c) => c.get_write(),
            Chop::Excl(c) => c.get_write(),
            Chop::Dumb(c) => c.get_write(),
            Chop::OrderedRw(c) => c.get_write(),
            Chop::OrderedExcl(c) => c.get_write(),
            Chop::OrderedDumb(c) => c.get_write(),
        }
    }

    fn get_read(&self) -> Option<ReadProxy<'_, Chopstick>> {
        match self {
            Chop::Rw(c) => c.get_read(),
            Chop::Excl(c) => c.get_read(),
            Chop::Dumb(c) => c.get_read(),
            Chop::OrderedRw(c) => c.get_read(),
            Chop::OrderedExcl(c) => c.get_read(),
            Chop::OrderedDumb(c) => c.get_read(),
        }
    }

    fn get_write_auth(&self, auth: &Authorization) -> Option<WriteProxy<'_, Chopstick>> {
        match self {
            Chop::Rw(c) => c.get_write_auth(auth),
            Chop::Excl(c) => c.get_write_auth(auth),
            Chop::Dumb(c) => c.get_write_auth(auth),
            Chop::OrderedRw(c) => c.get_write_auth(auth),
            Chop::OrderedExcl(c) => c.get_write_auth(auth),
            Chop::OrderedDumb(c) => c.get_write_auth(auth),
        }
    }

    fn get_read_auth(&self, auth: &Authorization) -> Option<ReadProxy<'_, Chopstick>> {
        match self {
            Chop::Rw(c) => c.get_read_auth(auth),
            Chop::Excl(c) => c.get_read_auth(auth),
            Chop::Dumb(c) => c.get_read_auth(auth),
            Chop::OrderedRw(c) => c.get_read_auth(auth),
            Chop::OrderedExcl(c) => c.get_read_auth(auth),
            Chop::OrderedDumb(c) => c.get_read_auth(auth),
        }
    }

    fn get_write_multi<'a>(
        &'a self,
        meta: &'a MetaLock,
        auth: &Authorization,
    ) -> Option<WriteProxy<'a, Chopstick>> {
        match self {
            Chop::Rw(c) => c.get_write_multi(meta, auth),
            Chop::Excl(c) => c.get_write_multi(meta, auth),
            Chop::Dumb(c) => c.get_write_multi(meta, auth),
            Chop::OrderedRw(c) => c.get_write_multi(meta, auth),
            Chop::OrderedExcl(c) => c.get_write_multi(meta, auth),
            Chop::OrderedDumb(c) => c.get_write_multi(meta, auth),
        }
    }

    fn get_read_multi<'a>(
        &'a self,
        meta: &'a MetaLock,
        auth: &Authorization,
    ) -> Option<ReadProxy<'a, Chopstick>> {
        match self {
            Chop::Rw(c) => c.get_read_multi(meta, auth),
            Chop::Excl(c) => c.get_read_multi(meta, auth),
            Chop::Dumb(c) => c.get_read_multi(meta, auth),
            Chop::OrderedRw(c) => c.get_read_multi(meta, auth),
            Chop::OrderedExcl(c) => c.get_read_multi(meta, auth),
            Chop::OrderedDumb(c) => c.get_read_multi(meta, auth),
        }
    }
}

fn new_auth(kind: AuthKind) -> Authorization {
    match kind {
        AuthKind::MultiReadOneWrite => Authorization::new(MultiReadOneWrite::default()),
        AuthKind::ExclusiveTracking => Authorization::new(ExclusiveTracking::default()),
        AuthKind::OrderedMultiReadOneWrite => {
            Authorization::new(OrderedPolicy::<MultiReadOneWrite>::default())
        }
        AuthKind::OrderedExclusiveTracking => {
            Authorization::new(OrderedPolicy::<ExclusiveTracking>::default())
        }
    }
}

struct Philosopher<'a> {
    number: usize,
    deadlock: bool,
    method: Method,
    auth_kind: AuthKind,
    meta: Option<&'a MetaLock>,
    left: &'a Chop,
    right: &'a Chop,
}

impl Philosopher<'_> {
    fn eat_dinner(&self, barrier: &Barrier) {
        barrier.wait();

        let auth = match self.method {
            Method::Unsafe => None,
            _ => Some(new_auth(self.auth_kind)),
        };

        let mut retries: u64 = 0;
        loop {
            // Skipping the wait every other retry lets the threads drift out
            // of sync, in case lockstep retries are what keeps them stuck.
            if retries > 0 && (retries as usize + self.number + 1) % 2 == 1 {
                self.timed_wait(false);
            }

            // Always succeeds when multi-locking is in use; `None` simply
            // means no meta-lock was configured.
            let gate = match (self.meta, &auth) {
                (Some(meta), Some(auth)) => match meta.get_write_auth(auth) {
                    Some(gate) => Some(gate),
                    None => process::exit(ERROR_LOGIC),
                },
                _ => None,
            };
            let using_multi = gate.is_some();

            // If the policy would refuse the first lock outright, the
            // configuration is unworkable; arguments should have caught it.
            if let Some(auth) = &auth {
                if !auth.guess_write_allowed(false, false, self.left.order()) {
                    process::exit(ERROR_LOGIC);
                }
            }
            let left = match self.acquire_left(&auth) {
                Some(left) => left,
                None => process::exit(ERROR_LOGIC),
            };

            // Hold the left chopstick for a moment to invite a deadlock.
            self.timed_wait(true);

            let right = self.acquire_right(&auth);
            drop(gate);
            match right {
                None => {
                    // Denied: put the left chopstick down and start over.
                    if using_multi {
                        process::exit(ERROR_LOGIC);
                    }
                    retries += 1;
                    continue;
                }
                Some(right) => {
                    let inherited = right.read().value;
                    let mut left = left.write();
                    left.value = if inherited < 0 {
                        self.number as i64
                    } else {
                        inherited
                    };
                    left.retries = retries;
                    println!("thread:\t{}\t{}\t{}", self.number, left.value, left.retries);
                    break;
                }
            }
        }

        barrier.wait();
    }

    fn acquire_left(&self, auth: &Option<Authorization>) -> Option<WriteProxy<'_, Chopstick>> {
        match (self.meta, auth) {
            (Some(meta), Some(auth)) => self.left.get_write_multi(meta, auth),
            (None, Some(auth)) => self.left.get_write_auth(auth),
            _ => self.left.get_write(),
        }
    }

    fn acquire_right(&self, auth: &Option<Authorization>) -> Option<ReadProxy<'_, Chopstick>> {
        match (self.meta, auth) {
            (Some(meta), Some(auth)) => self.right.get_read_multi(meta, auth),
            (None, Some(auth)) => self.right.get_read_auth(auth),
            _ => self.right.get_read(),
        }
    }

    fn timed_wait(&self, optional: bool) {
        if optional && !self.deadlock {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(message) => {
            process::exit(print_help(message.as_deref()));
        }
    };

    let meta = match config.method {
        Method::Multi => Some(MetaLock::new()),
        _ => None,
    };

    let chopsticks: Vec<Chop> = (0..config.threads)
        .map(|i| {
            Chop::new(
                config.lock_kind,
                config.method == Method::Ordered,
                i as Order + 1,
            )
        })
        .collect();

    let barrier = Barrier::new(config.threads + 1);
    let done = Arc::new(AtomicBool::new(false));

    // The watchdog decides when the table has deadlocked.
    {
        let done = Arc::clone(&done);
        let timeout = config.timeout;
        let watchdog = thread::Builder::new().spawn(move || {
            thread::sleep(Duration::from_secs(timeout));
            if !done.load(SeqCst) {
                println!("(deadlock timeout)");
                process::exit(ERROR_DEADLOCK);
            }
        });
        if watchdog.is_err() {
            eprintln!("failed to start the watchdog");
            process::exit(ERROR_SYSTEM);
        }
    }

    let start = Instant::now();

    thread::scope(|scope| {
        for number in 0..config.threads {
            let philosopher = Philosopher {
                number,
                deadlock: config.deadlock,
                method: config.method,
                auth_kind: config.auth_kind,
                meta: meta.as_ref(),
                left: &chopsticks[number],
                right: &chopsticks[(number + 1) % config.threads],
            };
            let barrier = &barrier;
            if thread::Builder::new()
                .spawn_scoped(scope, move || philosopher.eat_dinner(barrier))
                .is_err()
            {
                eprintln!("failed to start a philosopher");
                process::exit(ERROR_THREAD);
            }
        }
        barrier.wait();
        barrier.wait();
        done.store(true, SeqCst);
    });

    let elapsed = start.elapsed();

    // A permissive pass over the final table; ordered containers still need
    // an order-aware authorization.
    let auth = Authorization::new(OrderedPolicy::<MultiReadOneWrite>::default());
    for (i, chop) in chopsticks.iter().enumerate() {
        let read = match chop.get_read_auth(&auth) {
            Some(read) => read,
            None => process::exit(ERROR_LOGIC),
        };
        let value = read.read();
        println!("final:\t{}\t{}\t{}", i, value.value, value.retries);
    }

    println!("time: {}", elapsed.as_secs_f64());
    process::exit(SUCCESS);
}

fn parse_args() -> Result<Config, Option<String>> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 6 && args.len() != 7 {
        return Err(None);
    }

    let number = |index: usize, what: &str| -> Result<i64, Option<String>> {
        args[index]
            .parse::<i64>()
            .map_err(|_| Some(format!("invalid {what}")))
    };

    let threads = number(1, "number of threads")?;
    if !(2..=256).contains(&threads) {
        return Err(Some("invalid number of threads".into()));
    }
    let method = match number(2, "lock method")? {
        0 => Method::Unsafe,
        1 => Method::Auth,
        2 => Method::Multi,
        3 => Method::Ordered,
        _ => return Err(Some("invalid lock method".into())),
    };
    let deadlock = match number(3, "deadlock value")? {
        0 => false,
        1 => true,
        _ => return Err(Some("invalid deadlock value".into())),
    };
    let lock_kind = match number(4, "lock kind")? {
        0 => LockKind::SharedExclusive,
        1 => LockKind::ExclusiveOnly,
        2 => LockKind::Untracked,
        _ => return Err(Some("invalid lock kind".into())),
    };
    let auth_kind = match number(5, "auth kind")? {
        0 => AuthKind::MultiReadOneWrite,
        1 => AuthKind::ExclusiveTracking,
        2 => AuthKind::OrderedMultiReadOneWrite,
        3 => AuthKind::OrderedExclusiveTracking,
        _ => return Err(Some("invalid auth kind".into())),
    };
    let timeout = if args.len() == 7 {
        let timeout = number(6, "timeout value")?;
        if timeout < 1 {
            return Err(Some("invalid timeout value".into()));
        }
        timeout as u64
    } else {
        1
    };

    if method == Method::Unsafe && !matches!(auth_kind, AuthKind::MultiReadOneWrite) {
        return Err(Some("auth kind must be 0 with unsafe locking".into()));
    }
    if method == Method::Ordered
        && matches!(
            auth_kind,
            AuthKind::MultiReadOneWrite | AuthKind::ExclusiveTracking
        )
    {
        return Err(Some("auth kind must be >= 2 with ordered locks".into()));
    }
    if method == Method::Multi && deadlock {
        return Err(Some("cannot cause a deadlock with multi-locking".into()));
    }

    Ok(Config {
        threads: threads as usize,
        method,
        deadlock,
        lock_kind,
        auth_kind,
        timeout,
    })
}

fn print_help(message: Option<&str>) -> i32 {
    let name = env::args().next().unwrap_or_else(|| "dine".into());
    if let Some(message) = message {
        eprintln!("{name}: {message}");
    }
    eprintln!("{name} [threads] [lock method] [deadlock?] [lock kind] [auth kind] (timeout)");
    eprintln!("[threads]: number of philosophers to seat (2-256)");
    eprintln!("[lock method]: container locking method to use");
    eprintln!("  0: unsafe (no deadlock prevention)");
    eprintln!("  1: authorization only");
    eprintln!("  2: multi-locking");
    eprintln!("  3: ordered locking");
    eprintln!("[deadlock?]: attempt to cause a deadlock?");
    eprintln!("  0: no");
    eprintln!("  1: yes");
    eprintln!("[lock kind]: kind of container locks to use");
    eprintln!("  0: shared-exclusive");
    eprintln!("  1: exclusive-only");
    eprintln!("  2: untracked");
    eprintln!("[auth kind]: kind of authorization objects to use");
    eprintln!("  0: multi-read-one-write");
    eprintln!("  1: exclusive-tracking");
    eprintln!("  2: ordered multi-read-one-write");
    eprintln!("  3: ordered exclusive-tracking");
    eprintln!("(timeout): time in seconds to wait for a deadlock (default: 1)");
    ERROR_ARGS
}
