//! One-off sample data generation for development databases.

use std::collections::{HashMap, HashSet};

use clap::Subcommand;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    Set,
};

use crate::database::model::ticket_buy::TicketClass;
use crate::database::model::{flight, passenger, ticket_buy, user};
use crate::seat::random_free_seat;

const FIRST_NAMES: &[&str] = &[
    "Wei", "Mei", "Arjun", "Siti", "Hiroshi", "Emma", "Liam", "Nur", "Chloe", "Rahul", "Aisha",
    "Daniel", "Yuki", "Farhan", "Grace", "Minh",
];

const LAST_NAMES: &[&str] = &[
    "Tan", "Lim", "Ng", "Kumar", "Rahman", "Sato", "Smith", "Nguyen", "Wong", "Lee", "Abdullah",
    "Chen", "Garcia", "Ong", "Pillai", "Teo",
];

const INSERT_BATCH: usize = 500;

#[derive(Debug, Clone, Subcommand)]
pub enum SeedTask {
    /// Insert passengers with random names
    Passengers {
        #[arg(long, default_value_t = 100)]
        count: usize,
    },
    /// Link every user to random passenger/flight pairs
    Tickets {
        #[arg(long, default_value_t = 3)]
        per_user: usize,
    },
    /// Give every ticket without a seat a random free one
    Seats,
}

pub fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub async fn run<C: ConnectionTrait>(db: &C, task: SeedTask, rng: &mut StdRng) -> Result<(), DbErr> {
    match task {
        SeedTask::Passengers { count } => seed_passengers(db, count, rng).await,
        SeedTask::Tickets { per_user } => seed_tickets(db, per_user, rng).await,
        SeedTask::Seats => assign_seats(db, rng).await,
    }
}

fn fake_passenger<R: Rng>(rng: &mut R) -> passenger::ActiveModel {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Alex");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Doe");
    let letter = rng.gen_range(b'A'..=b'Z') as char;
    let passport = format!("{letter}{:07}{}", rng.gen_range(0..10_000_000), rng.gen_range(b'A'..=b'Z') as char);

    passenger::ActiveModel {
        first_name: Set(first.to_string()),
        last_name: Set(last.to_string()),
        passport_no: Set(Some(passport)),
        ..Default::default()
    }
}

fn random_class<R: Rng>(rng: &mut R) -> TicketClass {
    // Mostly economy, like a real cabin
    match rng.gen_range(0..100) {
        0..=69 => TicketClass::Economy,
        70..=84 => TicketClass::PremiumEconomy,
        85..=96 => TicketClass::Business,
        _ => TicketClass::First,
    }
}

pub async fn seed_passengers<C: ConnectionTrait>(db: &C, count: usize, rng: &mut StdRng) -> Result<(), DbErr> {
    let passengers: Vec<_> = (0..count).map(|_| fake_passenger(rng)).collect();
    for batch in passengers.chunks(INSERT_BATCH) {
        passenger::Entity::insert_many(batch.to_vec())
            .exec_without_returning(db)
            .await?;
    }
    info!("Inserted {} passengers", count);
    Ok(())
}

/// Random (passenger, flight) pairs per user. Pairs already owned are skipped by the insert.
pub fn pick_tickets<R: Rng>(
    rng: &mut R,
    users: &[String],
    passengers: &[i32],
    flights: &[i32],
    per_user: usize,
) -> Vec<ticket_buy::Model> {
    if passengers.is_empty() || flights.is_empty() {
        return Vec::new();
    }

    let mut tickets = Vec::new();
    for uid in users {
        let mut picked = HashSet::new();
        let wanted = per_user.min(passengers.len() * flights.len());
        while picked.len() < wanted {
            let pid = passengers[rng.gen_range(0..passengers.len())];
            let fid = flights[rng.gen_range(0..flights.len())];
            if picked.insert((pid, fid)) {
                tickets.push(ticket_buy::Model {
                    uid: uid.clone(),
                    pid,
                    fid,
                    seat_no: None,
                    class: random_class(rng),
                });
            }
        }
    }
    tickets
}

pub async fn seed_tickets<C: ConnectionTrait>(db: &C, per_user: usize, rng: &mut StdRng) -> Result<(), DbErr> {
    let users: Vec<String> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    let passengers: Vec<i32> = passenger::Entity::find()
        .select_only()
        .column(passenger::Column::Pid)
        .into_tuple()
        .all(db)
        .await?;
    let flights: Vec<i32> = flight::Entity::find()
        .select_only()
        .column(flight::Column::Fid)
        .into_tuple()
        .all(db)
        .await?;

    if passengers.is_empty() || flights.is_empty() {
        warn!("Nothing to link: {} passengers, {} flights", passengers.len(), flights.len());
        return Ok(());
    }

    let tickets = pick_tickets(rng, &users, &passengers, &flights, per_user);
    let mut inserted = 0;
    for batch in tickets.chunks(INSERT_BATCH) {
        let models = batch.iter().map(|t| ticket_buy::ActiveModel {
            uid: Set(t.uid.clone()),
            pid: Set(t.pid),
            fid: Set(t.fid),
            seat_no: Set(None),
            class: Set(t.class),
        });
        inserted += ticket_buy::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    ticket_buy::Column::Uid,
                    ticket_buy::Column::Pid,
                    ticket_buy::Column::Fid,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }
    info!("Linked {} tickets across {} users", inserted, users.len());
    Ok(())
}

pub async fn assign_seats<C: ConnectionTrait>(db: &C, rng: &mut StdRng) -> Result<(), DbErr> {
    let unseated = ticket_buy::Entity::find()
        .filter(ticket_buy::Column::SeatNo.is_null())
        .all(db)
        .await?;
    if unseated.is_empty() {
        info!("Every ticket already has a seat");
        return Ok(());
    }

    let fids: HashSet<i32> = unseated.iter().map(|t| t.fid).collect();
    let seated: Vec<(i32, String)> = ticket_buy::Entity::find()
        .select_only()
        .column(ticket_buy::Column::Fid)
        .column(ticket_buy::Column::SeatNo)
        .filter(ticket_buy::Column::Fid.is_in(fids))
        .filter(ticket_buy::Column::SeatNo.is_not_null())
        .into_tuple()
        .all(db)
        .await?;

    let mut taken: HashMap<i32, HashSet<String>> = HashMap::new();
    for (fid, seat) in seated {
        taken.entry(fid).or_default().insert(seat);
    }

    let mut assigned = 0;
    for ticket in unseated {
        let seats = taken.entry(ticket.fid).or_default();
        let Some(seat) = random_free_seat(rng, seats) else {
            warn!("Flight {} is full, ticket {}/{} left without a seat", ticket.fid, ticket.uid, ticket.pid);
            continue;
        };
        seats.insert(seat.clone());

        let mut active: ticket_buy::ActiveModel = ticket.into();
        active.seat_no = Set(Some(seat));
        active.update(db).await?;
        assigned += 1;
    }
    info!("Assigned {} seats", assigned);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn seeded_rng_is_reproducible() {
        let a: Vec<u32> = (0..5).map(|_| rng(Some(9)).gen_range(0..1000)).collect();
        let b: Vec<u32> = (0..5).map(|_| rng(Some(9)).gen_range(0..1000)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn fake_passengers_have_passports() {
        let mut rng = rng(Some(1));
        let p = fake_passenger(&mut rng);
        let passport = p.passport_no.clone().unwrap().unwrap();
        assert_eq!(passport.len(), 9);
        assert!(FIRST_NAMES.contains(&p.first_name.clone().unwrap().as_str()));
    }

    #[test]
    fn picked_tickets_are_unique_per_user() {
        let mut rng = rng(Some(3));
        let users = vec!["u1".to_string(), "u2".to_string()];
        let tickets = pick_tickets(&mut rng, &users, &[1, 2], &[10, 20, 30], 4);
        assert_eq!(tickets.len(), 8);
        for uid in &users {
            let keys: HashSet<_> = tickets
                .iter()
                .filter(|t| &t.uid == uid)
                .map(|t| (t.pid, t.fid))
                .collect();
            assert_eq!(keys.len(), 4);
        }
    }

    #[test]
    fn picking_is_bounded_by_available_pairs() {
        let mut rng = rng(Some(3));
        let tickets = pick_tickets(&mut rng, &["u1".to_string()], &[1], &[10], 5);
        assert_eq!(tickets.len(), 1);
        assert!(pick_tickets(&mut rng, &["u1".to_string()], &[], &[10], 5).is_empty());
    }

    #[actix_web::test]
    async fn passengers_are_inserted_in_batches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult { last_insert_id: 0, rows_affected: 500 },
                MockExecResult { last_insert_id: 0, rows_affected: 20 },
            ])
            .into_connection();

        seed_passengers(&db, 520, &mut rng(Some(2))).await.unwrap();
        assert_eq!(db.into_transaction_log().len(), 2);
    }
}
