use {crate::thread_token::thread_token, std::thread};

#[test]
fn token() {
    assert_ne!(thread_token(), 0);
    assert_eq!(thread_token(), thread_token());
    let other = thread::spawn(thread_token).join().unwrap();
    assert_ne!(thread_token(), other);
}
