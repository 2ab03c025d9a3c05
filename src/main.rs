use ownbox::{Tracking, UniqueBox};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

type Owned = UniqueBox<i32, Tracking>;

fn report(name: &str, owner: &Owned) {
    println!("Address of {} owner is: {:p}", name, owner.address_of());
    println!("Address of {}'s managed value is: {:p}", name, owner.raw_address());
    if owner.is_holding() {
        println!("Value of {} is: {}", name, **owner);
    } else {
        println!("{} is empty", name);
    }
}

// The owner is released when this returns.
fn cleans_up(heap: &Tracking) {
    let temp = Owned::new_in(4096, heap.clone());
    report("temp", &temp);
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let heap = Tracking::new();

    let mut mine = Owned::new_in(1024, heap.clone());
    report("mine", &mine);

    *mine = 2048;
    report("mine", &mine);

    cleans_up(&heap);
    let stats = heap.stats();
    info!(allocs = stats.allocs, frees = stats.frees, "after cleans_up");
    println!("Allocations: {}, releases: {}, still owned: {}",
             stats.allocs, stats.frees, stats.outstanding());

    let mut theirs = Owned::empty_in(heap.clone());
    mine.transfer_to(&mut theirs);
    report("mine", &mine);
    report("theirs", &theirs);

    drop(theirs);
    drop(mine);
    let stats = heap.stats();
    info!(allocs = stats.allocs, frees = stats.frees, "all owners dropped");
}
