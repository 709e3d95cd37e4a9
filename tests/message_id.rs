use std::{collections::HashSet, sync::Arc, thread};

use missive::{
    message::{
        message_id::{MessageIdGenerator, RandomSource},
        Message, Part, Serializer,
    },
    Error,
};

const THREADS: usize = 8;
const PER_THREAD: usize = 1250;

#[test]
fn parallel_ids_are_unique() {
    let generator = Arc::new(MessageIdGenerator::default());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|_| generator.generate().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::with_capacity(THREADS * PER_THREAD);
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(id.starts_with('<') && id.ends_with('>'));
            assert!(id.contains('@'));
            assert!(!id.contains(|c: char| c.is_whitespace() || c.is_control()));
            assert!(seen.insert(id));
        }
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
}

#[test]
fn parallel_serialization_of_clones() {
    let message = Message::builder()
        .from("a@x.com")
        .to("b@y.com")
        .body(Part::text_plain("same content".into()))
        .build()
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let mut copy = message.clone();
            thread::spawn(move || {
                copy.formatted().unwrap();
                copy.message_id().unwrap().to_owned()
            })
        })
        .collect();

    let ids: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), THREADS);
}

struct Drained;

impl RandomSource for Drained {
    fn fill_bytes(&self, _dest: &mut [u8]) -> Result<(), Error> {
        Err(Error::RandomnessUnavailable("source drained".into()))
    }
}

#[test]
fn no_fallback_when_randomness_fails() {
    let serializer = Serializer::with_generator(MessageIdGenerator::new(Drained));
    let mut message = Message::builder()
        .from("a@x.com")
        .to("b@y.com")
        .build()
        .unwrap();

    let err = serializer.serialize(&mut message).unwrap_err();
    assert!(matches!(err, Error::RandomnessUnavailable(_)));
    assert_eq!(message.message_id(), None);
}
