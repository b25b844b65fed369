use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use typewriter::playback::drive;
use typewriter::timer::ManualTimer;
use typewriter::{shared, BufferSurface, Typewriter, TypewriterConfig, WriteOptions};

fn writer(interval_ms: u64) -> Typewriter {
    Typewriter::with_rng(
        TypewriterConfig::with_interval(interval_ms),
        StdRng::seed_from_u64(1),
    )
    .expect("valid config")
}

fn run(tw: &mut Typewriter) {
    let stop = AtomicBool::new(false);
    drive(tw, &mut ManualTimer::new(), &stop).expect("drive should finish");
}

#[test]
fn appends_run_in_order_and_fire_callbacks_in_order() {
    let mut tw = writer(10);
    let buf = shared(BufferSurface::new());
    let order = Rc::new(RefCell::new(Vec::new()));

    let log = order.clone();
    tw.append(
        buf.clone(),
        "Hi",
        WriteOptions::new().callback(move |_| log.borrow_mut().push("cb1")),
    )
    .unwrap();
    let log = order.clone();
    tw.append(
        buf.clone(),
        "!",
        WriteOptions::new().callback(move |_| log.borrow_mut().push("cb2")),
    )
    .unwrap();

    assert_eq!(tw.queue_len(), 1);
    run(&mut tw);

    assert_eq!(buf.borrow().as_str(), "Hi!");
    assert_eq!(*order.borrow(), vec!["cb1", "cb2"]);
    assert_eq!(tw.queue_len(), 0);
    assert!(!tw.is_active());
}

#[test]
fn queue_length_drops_when_next_request_starts() {
    let mut tw = writer(10);
    let buf = shared(BufferSurface::new());
    tw.append(buf.clone(), "Hi", WriteOptions::new()).unwrap();
    tw.append(buf.clone(), "!", WriteOptions::new()).unwrap();
    assert_eq!(tw.queue_len(), 1);

    tw.wake(10);
    assert_eq!(buf.borrow().as_str(), "Hi");
    assert_eq!(tw.queue_len(), 1);

    // "Hi" finishes and "!" starts within the same wake-up.
    tw.wake(20);
    assert_eq!(buf.borrow().as_str(), "Hi!");
    assert_eq!(tw.queue_len(), 0);
}

#[test]
fn write_clears_and_append_keeps_existing_contents() {
    let mut tw = writer(5);
    let a = shared(BufferSurface::new().with_contents("old"));
    let b = shared(BufferSurface::new().with_contents("old"));

    tw.write(a.clone(), "new", WriteOptions::new()).unwrap();
    tw.append(b.clone(), "new", WriteOptions::new()).unwrap();
    run(&mut tw);

    assert_eq!(a.borrow().as_str(), "new");
    assert_eq!(b.borrow().as_str(), "oldnew");
}

#[test]
fn requests_for_different_surfaces_still_serialize() {
    let mut tw = writer(10);
    let first = shared(BufferSurface::new());
    let second = shared(BufferSurface::new());

    tw.append(first.clone(), "abc", WriteOptions::new()).unwrap();
    tw.append(second.clone(), "xyz", WriteOptions::new()).unwrap();

    tw.wake(10);
    assert_eq!(first.borrow().as_str(), "ab");
    assert_eq!(second.borrow().as_str(), "");

    run(&mut tw);
    assert_eq!(first.borrow().as_str(), "abc");
    assert_eq!(second.borrow().as_str(), "xyz");
}

#[test]
fn clear_queue_keeps_the_active_job() {
    let mut tw = writer(10);
    let buf = shared(BufferSurface::new());
    tw.append(buf.clone(), "one", WriteOptions::new()).unwrap();
    tw.append(buf.clone(), "two", WriteOptions::new()).unwrap();
    tw.append(buf.clone(), "three", WriteOptions::new()).unwrap();

    tw.clear_queue();
    assert_eq!(tw.queue_len(), 0);
    assert!(tw.is_active());

    run(&mut tw);
    assert_eq!(buf.borrow().as_str(), "one");
}

#[test]
fn callback_can_submit_follow_up_work() {
    let mut tw = writer(10);
    let buf = shared(BufferSurface::new());
    let target = buf.clone();
    tw.append(
        buf.clone(),
        "ab",
        WriteOptions::new().callback(move |tw| {
            tw.append(target.clone(), "cd", WriteOptions::new())
                .expect("follow-up accepted");
        }),
    )
    .unwrap();

    run(&mut tw);
    assert_eq!(buf.borrow().as_str(), "abcd");
}

#[test]
fn start_delay_waits_before_typing() {
    let mut tw = writer(10);
    let buf = shared(BufferSurface::new());
    tw.append(buf.clone(), "ab", WriteOptions::new().delay(40.0))
        .unwrap();
    assert_eq!(buf.borrow().as_str(), "");
    assert_eq!(tw.next_wake(), Some(40));

    run(&mut tw);
    assert_eq!(buf.borrow().as_str(), "ab");
    assert_eq!(tw.now(), 60);
}

#[test]
fn newlines_follow_the_surface_line_break() {
    let mut tw = writer(1);
    let html = shared(BufferSurface::html());
    let escaped = shared(BufferSurface::html());

    tw.append(html.clone(), "a\nb", WriteOptions::new()).unwrap();
    tw.append(escaped.clone(), "a\\nb", WriteOptions::new())
        .unwrap();
    run(&mut tw);

    assert_eq!(html.borrow().as_str(), "a<br>b");
    assert_eq!(escaped.borrow().as_str(), "a\\nb");
}
