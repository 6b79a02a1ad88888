// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;
use std::collections::HashMap;

/// Redis客户端
///
/// 提供对Redis数据库的异步操作接口
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// 只校验URL，不会立即建立连接
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - URL无效
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 写入哈希并把成员加入索引集合
    ///
    /// 两条命令在同一个 MULTI/EXEC 事务中执行
    ///
    /// # 参数
    ///
    /// * `hash_key` - 哈希键
    /// * `fields` - 哈希字段
    /// * `index_key` - 索引集合键
    /// * `member` - 加入索引的成员
    pub async fn hset_with_index(
        &self,
        hash_key: &str,
        fields: &[(&str, String)],
        index_key: &str,
        member: &str,
    ) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        redis::pipe()
            .atomic()
            .hset_multiple(hash_key, fields)
            .ignore()
            .sadd(index_key, member)
            .ignore()
            .query_async::<()>(&mut con)
            .await?;
        Ok(())
    }

    /// 获取哈希的全部字段，键不存在时返回空映射
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: HashMap<String, String> = con.hgetall(key).await?;
        Ok(value)
    }

    /// 获取集合成员
    pub async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let members: Vec<String> = con.smembers(key).await?;
        Ok(members)
    }

    /// 按模式列出键
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let keys: Vec<String> = con.keys(pattern).await?;
        Ok(keys)
    }

    /// 发送 PING
    pub async fn ping(&self) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut con).await?;
        Ok(())
    }
}
