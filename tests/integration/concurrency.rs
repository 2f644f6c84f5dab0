use crate::integration::support::{temp_backend, urls};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn index_readers_never_see_partial_genres() {
    let (_dir, mut backend) = temp_backend();
    let index = backend.genre_index();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = index.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut seen = HashMap::new();
                while !done.load(Ordering::SeqCst) {
                    for name in index.names() {
                        // a listed name always resolves, and always to the same node
                        let id = index.get(&name).unwrap();
                        assert_eq!(*seen.entry(name).or_insert(id), id);
                    }
                }
                seen.len()
            })
        })
        .collect();

    for i in 0..100 {
        backend
            .add_station_full(
                &urls(&[&format!("http://s{}", i)]),
                &format!("Station {}", i),
                &format!("Genre {}", i % 25),
            )
            .unwrap();
    }
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        assert!(reader.join().unwrap() <= 26);
    }
    assert_eq!(backend.genre_count(), 25);
    assert_eq!(index.len(), 26);
}
