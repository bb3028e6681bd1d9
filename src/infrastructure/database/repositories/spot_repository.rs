//! SeaORM implementation of ParkingSpotRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use super::convert::{collect, spot_to_domain};
use crate::domain::spot::{ParkingSpot, ParkingSpotRepository, SpotStatus};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::parking_spot;

pub struct SeaOrmSpotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSpotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ParkingSpotRepository for SeaOrmSpotRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSpot>> {
        parking_spot::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(spot_to_domain)
            .transpose()
    }

    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        let rows = parking_spot::Entity::find()
            .filter(parking_spot::Column::ParkingLotId.eq(lot_id))
            .order_by_asc(parking_spot::Column::Id)
            .all(&self.db)
            .await?;
        collect(rows, spot_to_domain)
    }

    async fn find_by_status(&self, status: SpotStatus) -> DomainResult<Vec<ParkingSpot>> {
        let rows = parking_spot::Entity::find()
            .filter(parking_spot::Column::Status.eq(status.as_str()))
            .order_by_asc(parking_spot::Column::Id)
            .all(&self.db)
            .await?;
        collect(rows, spot_to_domain)
    }

    async fn find_by_lot_and_status(
        &self,
        lot_id: i32,
        status: SpotStatus,
    ) -> DomainResult<Vec<ParkingSpot>> {
        let rows = parking_spot::Entity::find()
            .filter(parking_spot::Column::ParkingLotId.eq(lot_id))
            .filter(parking_spot::Column::Status.eq(status.as_str()))
            .order_by_asc(parking_spot::Column::Id)
            .all(&self.db)
            .await?;
        collect(rows, spot_to_domain)
    }

    async fn count_by_lot_and_status(&self, lot_id: i32, status: SpotStatus) -> DomainResult<u64> {
        Ok(parking_spot::Entity::find()
            .filter(parking_spot::Column::ParkingLotId.eq(lot_id))
            .filter(parking_spot::Column::Status.eq(status.as_str()))
            .count(&self.db)
            .await?)
    }
}
