//! Общие контракты мастера создания заказа аренды.
//!
//! Крейт содержит DTO внешних сервисов (клиенты, каталог, единицы техники,
//! маршруты) и всю клиентскую бизнес-логику черновика заказа: хранилище,
//! валидаторы шагов, подбор единиц, расчёт стоимости и контроллер мастера.

pub mod domain;
pub mod shared;
