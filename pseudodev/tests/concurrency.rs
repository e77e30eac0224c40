//! Handles and descriptors driven from concurrent tasks

use pseudodev::access::O_RDWR;
use pseudodev::transfer::SEEK_SET;
use pseudodev::{AccessMode, Devices, FdTable, Whence};
use std::sync::Arc;

const RW: usize = 2;
const CAPACITY: usize = 256;
const CHUNK: usize = 64;
const WRITERS: u8 = 8;
const ROUNDS: usize = 200;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_never_tear() {
    init_tracing();
    let devices = Arc::new(Devices::default());

    let mut tasks = Vec::new();
    for id in 1..=WRITERS {
        let devices = Arc::clone(&devices);
        tasks.push(tokio::task::spawn_blocking(move || {
            let mut handle = devices.open(RW, AccessMode::Write).unwrap();
            let chunk = [id; CHUNK];
            for _ in 0..ROUNDS {
                devices.seek(&mut handle, 0, Whence::Start).unwrap();
                assert_eq!(devices.write(&mut handle, &chunk[..]).unwrap(), CHUNK);
                assert!(handle.position() <= CAPACITY as i64);
            }
            devices.close(handle);
        }));
    }

    let reader = {
        let devices = Arc::clone(&devices);
        tokio::task::spawn_blocking(move || {
            let mut handle = devices.open(RW, AccessMode::Read).unwrap();
            for _ in 0..ROUNDS {
                devices.seek(&mut handle, 0, Whence::Start).unwrap();
                let mut out = Vec::new();
                let n = devices.read(&mut handle, &mut out, CHUNK).unwrap();
                // Either nothing written yet or one writer's whole chunk
                assert!(n == 0 || n == CHUNK, "unexpected read of {n} bytes");
                if let Some(&first) = out.first() {
                    assert!(out.iter().all(|&b| b == first), "torn read: {out:?}");
                }
            }
        })
    };

    for task in tasks {
        task.await.unwrap();
    }
    reader.await.unwrap();

    let stat = devices.stat(RW).unwrap();
    assert_eq!(stat.high_water_mark, CHUNK);
    let endpoint = devices.registry().resolve(RW).unwrap();
    let guard = endpoint.lock();
    let winner = guard[0];
    assert!((1..=WRITERS).contains(&winner));
    assert!(guard[..CHUNK].iter().all(|&b| b == winner));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_keep_mark_in_bounds() {
    init_tracing();
    let devices = Arc::new(Devices::default());

    let mut tasks = Vec::new();
    for id in 0..WRITERS {
        let devices = Arc::clone(&devices);
        tasks.push(tokio::task::spawn_blocking(move || {
            let mut handle = devices.open(RW, AccessMode::Write).unwrap();
            let offset = i64::from(id) * 30;
            for _ in 0..ROUNDS {
                devices.seek(&mut handle, offset, Whence::Start).unwrap();
                // Later offsets spill past the end and become partial writes
                let n = devices.write(&mut handle, &[id; CHUNK][..]).unwrap();
                assert!(n <= CHUNK);
                let mark = devices.stat(RW).unwrap().high_water_mark;
                assert!(mark <= CAPACITY);
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    let mark = devices.stat(RW).unwrap().high_water_mark;
    let possible: Vec<usize> = (0..usize::from(WRITERS))
        .map(|id| (id * 30 + CHUNK).min(CAPACITY))
        .collect();
    assert!(possible.contains(&mark), "mark {mark} not a write end");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_descriptors_on_separate_endpoints_run_concurrently() {
    init_tracing();
    let fds = Arc::new(FdTable::default());

    let mut tasks = Vec::new();
    for minor in [2usize, 3] {
        let fds = Arc::clone(&fds);
        tasks.push(tokio::task::spawn_blocking(move || {
            let fd = fds.open(minor, O_RDWR).unwrap();
            let fill = u8::try_from(minor).unwrap();
            let mut buf = [0u8; CHUNK];
            for _ in 0..ROUNDS {
                fds.lseek(fd, 0, SEEK_SET).unwrap();
                assert_eq!(fds.write(fd, &[fill; CHUNK]).unwrap(), CHUNK);
                fds.lseek(fd, 0, SEEK_SET).unwrap();
                assert_eq!(fds.read(fd, &mut buf).unwrap(), CHUNK);
                assert!(buf.iter().all(|&b| b == fill));
            }
            fds.close(fd).unwrap();
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(fds.open_count(), 0);
    assert_eq!(fds.devices().stat(2).unwrap().high_water_mark, CHUNK);
    assert_eq!(fds.devices().stat(3).unwrap().high_water_mark, CHUNK);
}
