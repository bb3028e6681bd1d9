//! SeaORM implementation of ParkingLotRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

use super::convert::{collect, lot_to_domain};
use crate::domain::lot::{LotOccupancy, LotStatus, ParkingLot, ParkingLotRepository};
use crate::domain::spot::SpotStatus;
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{parking_lot, parking_spot};

pub struct SeaOrmLotRepository {
    db: DatabaseConnection,
}

impl SeaOrmLotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ParkingLotRepository for SeaOrmLotRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingLot>> {
        parking_lot::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(lot_to_domain)
            .transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingLot>> {
        let rows = parking_lot::Entity::find()
            .order_by_asc(parking_lot::Column::Id)
            .all(&self.db)
            .await?;
        collect(rows, lot_to_domain)
    }

    async fn find_by_status(&self, status: LotStatus) -> DomainResult<Vec<ParkingLot>> {
        let rows = parking_lot::Entity::find()
            .filter(parking_lot::Column::Status.eq(status.as_str()))
            .order_by_asc(parking_lot::Column::Id)
            .all(&self.db)
            .await?;
        collect(rows, lot_to_domain)
    }

    async fn total_available_spots(&self) -> DomainResult<u64> {
        let active = self.find_by_status(LotStatus::Active).await?;
        Ok(active.iter().map(|l| u64::from(l.available_spots)).sum())
    }

    async fn occupancy(&self, lot_id: i32) -> DomainResult<Option<LotOccupancy>> {
        let txn = self.db.begin().await?;

        let Some(model) = parking_lot::Entity::find_by_id(lot_id).one(&txn).await? else {
            txn.commit().await?;
            return Ok(None);
        };
        let lot = lot_to_domain(model)?;

        let mut counts = [0u64; 4];
        for (slot, status) in counts.iter_mut().zip(SpotStatus::ALL) {
            *slot = parking_spot::Entity::find()
                .filter(parking_spot::Column::ParkingLotId.eq(lot_id))
                .filter(parking_spot::Column::Status.eq(status.as_str()))
                .count(&txn)
                .await?;
        }
        txn.commit().await?;

        let [available, reserved, occupied, maintenance] = counts;
        Ok(Some(LotOccupancy {
            lot,
            available,
            reserved,
            occupied,
            maintenance,
        }))
    }
}
