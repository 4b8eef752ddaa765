use std::thread;

use super::*;
use crate::backend::Sequential;
use crate::raster::Raster;

fn noisy_padded(width: usize, height: usize, window: WindowSize) -> PaddedRaster {
    let data = (0..width * height)
        .map(|i| match (i * 7) % 13 {
            0 => 0,
            1 => 255,
            _ => (60 + (i * 31) % 120) as u8,
        })
        .collect();
    let plane = Raster::new_with_data(width, height, 1, data).unwrap();
    PaddedRaster::new(&plane, window.max).unwrap()
}

#[test]
fn test_zero_ranks_rejected() {
    assert!(matches!(
        Distributed::new(0, Halo::Scatter),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_matches_sequential_for_both_halo_modes() {
    let window = WindowSize::new(3, 7);
    let padded = noisy_padded(29, 31, window);
    let expected = Sequential.run(&padded, window).unwrap();

    for halo in [Halo::Scatter, Halo::Broadcast] {
        for ranks in [1, 2, 3, 4, 7] {
            let output = Distributed::new(ranks, halo)
                .unwrap()
                .run(&padded, window)
                .unwrap();
            assert_eq!(output, expected, "ranks = {ranks}, halo = {halo:?}");
        }
    }
}

#[test]
fn test_more_ranks_than_rows() {
    let window = WindowSize::new(3, 5);
    let padded = noisy_padded(11, 3, window);

    let output = Distributed::new(6, Halo::Scatter)
        .unwrap()
        .run(&padded, window)
        .unwrap();
    assert_eq!(output, Sequential.run(&padded, window).unwrap());
}

#[test]
fn test_world_star_topology() {
    let world = ChannelCommunicator::world(3);
    assert_eq!(world.len(), 3);
    assert!(world.iter().enumerate().all(|(i, c)| c.rank() == i && c.size() == 3));

    // Workers are linked to the root only.
    let reply = Message::Rows {
        start: 0,
        data: vec![],
    };
    assert!(matches!(
        world[1].send(2, reply.clone()),
        Err(Error::Transport(_))
    ));
    assert!(matches!(world[1].send(1, reply), Err(Error::Transport(_))));
}

#[test]
fn test_recv_buffers_out_of_order_messages() {
    let mut world = ChannelCommunicator::world(3);
    let worker2 = world.pop().unwrap();
    let worker1 = world.pop().unwrap();
    let mut root = world.pop().unwrap();

    worker2
        .send(ROOT, Message::Rows { start: 2, data: vec![2] })
        .unwrap();
    worker1
        .send(ROOT, Message::Rows { start: 1, data: vec![1] })
        .unwrap();

    assert!(matches!(root.recv(1).unwrap(), Message::Rows { start: 1, .. }));
    assert!(matches!(root.recv(2).unwrap(), Message::Rows { start: 2, .. }));
}

#[test]
fn test_recv_from_departed_rank_fails() {
    let mut world = ChannelCommunicator::world(2);
    let worker = world.pop().unwrap();
    let mut root = world.pop().unwrap();
    drop(worker);

    assert!(matches!(root.recv(1), Err(Error::Transport(_))));
}

#[test]
fn test_silent_worker_fails_the_pass() {
    let window = WindowSize::new(3, 5);
    let padded = noisy_padded(8, 8, window);

    let mut world = ChannelCommunicator::world(3);
    let silent = world.pop().unwrap();
    let honest = world.pop().unwrap();
    let root = world.pop().unwrap();

    let result = thread::scope(|scope| {
        let honest = scope.spawn(move || run_worker(honest));
        let silent = scope.spawn(move || {
            let mut comm = silent;
            // Takes the work and leaves without answering.
            comm.recv(ROOT).map(|_| ())
        });

        let result = run_root(root, &padded, window, Halo::Scatter);
        honest.join().unwrap().unwrap();
        silent.join().unwrap().unwrap();
        result
    });

    assert!(matches!(result, Err(Error::Transport(_))));
}

#[test]
fn test_misplaced_reply_rejected() {
    let window = WindowSize::new(3, 3);
    let padded = noisy_padded(6, 6, window);

    let mut world = ChannelCommunicator::world(2);
    let worker = world.pop().unwrap();
    let root = world.pop().unwrap();

    let result = thread::scope(|scope| {
        scope.spawn(move || {
            let mut comm = worker;
            if let Ok(Message::Work { rows, input, .. }) = comm.recv(ROOT) {
                let data = vec![0u8; rows.len() * input.width()];
                let _ = comm.send(
                    ROOT,
                    Message::Rows {
                        start: rows.start + 1,
                        data,
                    },
                );
            }
        });

        run_root(root, &padded, window, Halo::Scatter)
    });

    assert!(matches!(result, Err(Error::Transport(msg)) if msg.contains("rank 1")));
}

#[test]
fn test_worker_rejects_narrow_halo() {
    let mut world = ChannelCommunicator::world(2);
    let worker = world.pop().unwrap();
    let root = world.pop().unwrap();

    let narrow = noisy_padded(5, 5, WindowSize::new(3, 3));
    root.send(
        1,
        Message::Work {
            rows: 0..5,
            local: 0..5,
            window: WindowSize::new(3, 7),
            input: narrow,
        },
    )
    .unwrap();

    assert!(matches!(run_worker(worker), Err(Error::Transport(_))));
}
